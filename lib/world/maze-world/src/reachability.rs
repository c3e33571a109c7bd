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

// Bounded reachability and empowerment.
//
// Empowerment of a cell is log2 of the number of distinct cells an agent could end up in within
// n steps. With deterministic moves this is the channel capacity between an agent's n-step
// action sequences and its final position, measured in bits.

use std::collections::VecDeque;

use crate::{Grid, HashSet, Maze, MazeError, Position};

impl Maze {
    /// Number of distinct cells reachable from `pos` in at most `n` steps, including `pos`
    /// itself. `n == 0` always gives 1.
    pub fn reachable_count(&self, pos: &Position, n: usize) -> Result<usize, MazeError> {
        if !self.is_valid(pos) {
            return Err(MazeError::OutOfBounds(*pos));
        }

        let mut queue: VecDeque<(Position, usize)> = VecDeque::new();
        let mut visited: HashSet<Position> = HashSet::default();
        let mut count = 0;

        queue.push_back((*pos, 0));
        while let Some((current, depth)) = queue.pop_front() {
            // The queue is in non-decreasing depth order, so everything after this is too deep
            // as well.
            if depth > n {
                break;
            }
            if !visited.insert(current) {
                continue;
            }
            count += 1;
            for next in self.neighbors(&current)? {
                if !visited.contains(next) {
                    queue.push_back((*next, depth + 1));
                }
            }
        }

        debug_assert_eq!(count, visited.len());
        Ok(count)
    }

    /// Empowerment of `pos` over an `n` step horizon, in bits.
    pub fn empowerment_at(&self, pos: &Position, n: usize) -> Result<f64, MazeError> {
        self.reachable_count(pos, n)
            .map(|count| (count as f64).log2())
    }

    /// [`Maze::reachable_count`] for every cell.
    pub fn reachability_grid(&self, n: usize) -> Result<Grid<usize>, MazeError> {
        Grid::try_from_fn(self.grid_shape(), |pos| self.reachable_count(&pos, n))
    }

    /// [`Maze::empowerment_at`] for every cell.
    pub fn empowerment_grid(&self, n: usize) -> Result<Grid<f64>, MazeError> {
        Ok(self
            .reachability_grid(n)?
            .map(|count| (*count as f64).log2()))
    }
}
