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

use std::cell::RefCell;
use std::rc::Rc;

use maze_world::{Maze, MazeError, Wall};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{Experiment, ExperimentError, Rng};

/// Everything needed to build a maze and run an experiment on it. Missing JSON fields fall back
/// to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub width: usize,
    pub height: usize,

    /// Walls as pairs of `[x, y]` cells, applied in order.
    pub walls: Vec<Wall>,
    pub reward_chance: f64,
    pub trial_count: usize,
    pub step_budget: usize,

    /// Step horizon for reachability and empowerment grids.
    pub horizon: usize,
    pub seed: u64,
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ExperimentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ExperimentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn build_rng(&self) -> Rng {
        Rng::seed_from_u64(self.seed)
    }

    pub fn build_maze(&self, rng: &mut Rng) -> Result<Maze, MazeError> {
        Maze::new(
            self.width,
            self.height,
            self.walls.iter().copied(),
            self.reward_chance,
            rng,
        )
    }

    /// Seed an rng, draw the maze from it, and hand the same rng on to the experiment.
    pub fn build_experiment(&self) -> Result<Experiment, ExperimentError> {
        let mut rng = self.build_rng();
        let maze = self.build_maze(&mut rng)?;
        Experiment::new(
            self.trial_count,
            maze,
            self.step_budget,
            Rc::new(RefCell::new(rng)),
        )
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            walls: Vec::new(),
            reward_chance: 0.1,
            trial_count: 100,
            step_budget: 20,
            horizon: 3,
            seed: 42,
        }
    }
}
