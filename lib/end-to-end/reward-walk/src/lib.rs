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

//! Reward-seeking random walks on a maze, and a Monte-Carlo experiment that averages the reward
//! collected from every starting cell.

use std::cell::RefCell;
use std::ops::DerefMut;
use std::rc::Rc;
use std::time::Instant;

use maze_world::{Grid, Maze, MazeError, Position};
use rand::seq::SliceRandom;
use tracing::{info, trace};

mod config;

pub use config::ExperimentConfig;

pub type Rng = rand_pcg::Pcg64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// The agent has used up its step budget.
    #[error("agent has no steps left")]
    Stopped,

    #[error(transparent)]
    Maze(#[from] MazeError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    /// An average over zero trials is undefined.
    #[error("trial count must be positive")]
    NoTrials,

    #[error(transparent)]
    Maze(#[from] MazeError),

    #[error("invalid experiment config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Active,
    Stopped,
}

/// A random walker with a fixed step budget.
///
/// Each step the agent looks at the four cells around it. If any of them holds a reward it moves
/// to one of those at random, even through a wall. Otherwise it moves to a random cell that is
/// connected to its current cell. After moving it collects the reward of the cell it landed on.
/// Rewards are never used up, so the same cell pays out on every visit.
#[derive(Debug, Clone)]
pub struct Agent {
    position: Position,
    remaining_steps: usize,
    reward: u64,
}

impl Agent {
    /// Place an agent on `start`. The reward of the starting cell is collected straight away.
    pub fn new(maze: &Maze, start: Position, step_budget: usize) -> Result<Self, MazeError> {
        let reward = maze.reward_at(&start)?;
        Ok(Self {
            position: start,
            remaining_steps: step_budget,
            reward: u64::from(reward),
        })
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn remaining_steps(&self) -> usize {
        self.remaining_steps
    }

    pub fn total_reward(&self) -> u64 {
        self.reward
    }

    pub fn state(&self) -> AgentState {
        if self.remaining_steps == 0 {
            AgentState::Stopped
        } else {
            AgentState::Active
        }
    }

    /// In-bounds axis neighbours that hold a reward, in the order +x, -x, +y, -y. Walls are not
    /// consulted.
    pub fn sense_reward_neighbors(&self, maze: &Maze) -> Vec<Position> {
        self.position
            .axis_neighbors()
            .into_iter()
            .filter(|pos| maze.reward_at(pos).map_or(false, |reward| reward > 0))
            .collect()
    }

    /// Take one step and return the new position.
    ///
    /// A cell with no connections at all keeps the agent in place; the step is still spent.
    pub fn move_once<R>(&mut self, maze: &Maze, rng: &mut R) -> Result<Position, AgentError>
    where
        R: rand::Rng + ?Sized,
    {
        if self.remaining_steps == 0 {
            return Err(AgentError::Stopped);
        }

        let rewarded = self.sense_reward_neighbors(maze);
        let next = match rewarded.choose(rng) {
            Some(next) => *next,
            None => {
                // Sorted so that a seeded rng picks the same cell regardless of hash order.
                let mut connected: Vec<Position> =
                    maze.neighbors(&self.position)?.iter().copied().collect();
                connected.sort_unstable();
                connected.choose(rng).copied().unwrap_or(self.position)
            }
        };

        let reward = maze.reward_at(&next)?;
        self.position = next;
        self.remaining_steps -= 1;
        self.reward += u64::from(reward);
        Ok(next)
    }
}

/// Runs `trial_count` agents from every cell of a maze and averages the reward they collect.
pub struct Experiment {
    trial_count: usize,
    maze: Maze,
    step_budget: usize,
    rng: Rc<RefCell<Rng>>,
    result_grid: Grid<f64>,
}

impl Experiment {
    pub fn new(
        trial_count: usize,
        maze: Maze,
        step_budget: usize,
        rng: Rc<RefCell<Rng>>,
    ) -> Result<Self, ExperimentError> {
        if trial_count == 0 {
            return Err(ExperimentError::NoTrials);
        }
        let result_grid = Grid::filled(maze.grid_shape(), 0.0);
        Ok(Self {
            trial_count,
            maze,
            step_budget,
            rng,
            result_grid,
        })
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn trial_count(&self) -> usize {
        self.trial_count
    }

    pub fn step_budget(&self) -> usize {
        self.step_budget
    }

    /// Mean reward per starting cell. All zeros until [`Experiment::run`] has been called.
    pub fn result_grid(&self) -> &Grid<f64> {
        &self.result_grid
    }

    pub fn run(&mut self) -> Result<(), ExperimentError> {
        let grid_shape = self.maze.grid_shape();
        info!(
            width = grid_shape.width(),
            height = grid_shape.height(),
            trials = self.trial_count,
            steps = self.step_budget,
            "starting experiment"
        );
        let start = Instant::now();

        let rng = Rc::clone(&self.rng);
        let mut rng = rng.borrow_mut();
        for pos in grid_shape.positions() {
            let mut total_reward: u64 = 0;
            for _ in 0..self.trial_count {
                total_reward += self.trial(pos, rng.deref_mut())?;
            }
            let mean = total_reward as f64 / self.trial_count as f64;
            trace!(%pos, mean, "finished cell");

            let (col, row) = grid_shape.index_of(&pos)?;
            *self.result_grid.get_mut(col, row) = mean;
        }

        info!(elapsed = ?start.elapsed(), "finished experiment");
        Ok(())
    }

    // One agent from `start` until its budget is spent.
    fn trial(&self, start: Position, rng: &mut Rng) -> Result<u64, ExperimentError> {
        let mut agent = Agent::new(&self.maze, start, self.step_budget)?;
        loop {
            match agent.move_once(&self.maze, rng) {
                Ok(_) => {}
                Err(AgentError::Stopped) => break,
                Err(AgentError::Maze(e)) => return Err(e.into()),
            }
        }
        Ok(agent.total_reward())
    }
}
