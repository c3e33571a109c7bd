/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

use reward_walk::ExperimentConfig;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_DIRECTIVES: &str = "reward_walk=info,maze_world=info";

// RUST_LOG wins when it parses; otherwise only the two library targets log, at info.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

fn init_logging() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    fmt().with_env_filter(log_filter(rust_log.as_deref())).init();
}

// Run one reward-walk experiment and print the averaged rewards next to the empowerment of each
// cell. Pass a JSON config file as the only argument, or nothing to use the defaults.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading config");
            ExperimentConfig::from_json_str(&std::fs::read_to_string(path)?)?
        }
        None => ExperimentConfig::default(),
    };

    let mut experiment = config.build_experiment()?;
    experiment.run()?;

    let maze = experiment.maze();
    println!("walls: {}", maze.walls().len());
    println!("rewards:\n{}", maze.reward_grid());
    println!("degrees:\n{}", maze.degree_grid());
    println!(
        "empowerment ({} steps):\n{:.2}",
        config.horizon,
        maze.empowerment_grid(config.horizon)?
    );
    println!("mean reward:\n{:.2}", experiment.result_grid());
    Ok(())
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn test_rust_log_can_turn_on_library_debug() {
        let filter = log_filter(Some("maze_world=debug"));
        assert_eq!(filter.to_string(), "maze_world=debug");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_defaults_without_rust_log() {
        let filter = log_filter(None);
        let directives = filter.to_string();
        assert!(directives.contains("reward_walk=info"), "{}", directives);
        assert!(directives.contains("maze_world=info"), "{}", directives);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_unparseable_rust_log_falls_back_to_defaults() {
        let filter = log_filter(Some("maze_world=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
