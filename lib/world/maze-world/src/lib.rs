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

#![warn(missing_docs)]

//! Walled lattice mazes.
//!
//! A maze is a rectangular grid of cells. Every cell starts connected to its four axis-aligned
//! neighbours, and walls sever individual connections. Each cell also carries a binary reward
//! that is drawn once when the maze is built. Agents walk the maze, and the reachability engine
//! (see `reachability.rs`) measures how many cells can be reached within a number of steps.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod grid;
mod reachability;

pub use grid::Grid;

/// Hash map used for the connectivity graph.
pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// Hash set used for neighbour sets and the wall set.
pub type HashSet<T> = rustc_hash::FxHashSet<T>;

/// Maze error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MazeError {
    /// Position is outside of the grid.
    #[error("position is out of bounds: {0}")]
    OutOfBounds(Position),

    /// Wall does not join two adjacent cells inside the grid.
    #[error("invalid wall: {0}")]
    InvalidWall(Wall),

    /// Wall refers to an edge that is already gone, e.g. the same wall added twice.
    #[error("edge not found for wall: {0}")]
    EdgeNotFound(Wall),

    /// Reward chance is not a probability.
    #[error("reward chance must be within [0, 1]: {0}")]
    InvalidRewardChance(f64),

    /// Grid has a zero dimension.
    #[error("grid shape must be positive: {width}x{height}")]
    InvalidGridShape {
        /// Requested width.
        width: usize,

        /// Requested height.
        height: usize,
    },
}

/// A cell coordinate. Signed so that positions just off the edge of the grid can be expressed,
/// and then rejected, rather than wrapping around.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    /// Column.
    pub x: i32,

    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a new position.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four axis-aligned neighbours, in the order +x, -x, +y, -y. These are not clipped to
    /// any grid.
    pub fn axis_neighbors(&self) -> [Position; 4] {
        [
            Position::new(self.x + 1, self.y),
            Position::new(self.x - 1, self.y),
            Position::new(self.x, self.y + 1),
            Position::new(self.x, self.y - 1),
        ]
    }

    /// Two positions are adjacent when they differ by exactly one in exactly one axis.
    pub fn is_adjacent(&self, other: &Position) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx + dy == 1
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Position::new(x, y)
    }
}

impl From<Position> for (i32, i32) {
    fn from(pos: Position) -> Self {
        (pos.x, pos.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A severed connection between two cells. The pair is unordered: `Wall::new(a, b)` and
/// `Wall::new(b, a)` are the same wall.
///
/// Construction does not check anything. Bounds and adjacency are checked when the wall is
/// added to a [`Maze`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(Position, Position)", into = "(Position, Position)")]
pub struct Wall {
    first: Position,
    second: Position,
}

impl Wall {
    /// Create a new wall between two cells.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    /// The two cells separated by the wall, smallest first.
    pub fn cells(&self) -> (Position, Position) {
        (self.first, self.second)
    }
}

impl From<(Position, Position)> for Wall {
    fn from((a, b): (Position, Position)) -> Self {
        Wall::new(a, b)
    }
}

impl From<Wall> for (Position, Position) {
    fn from(wall: Wall) -> Self {
        wall.cells()
    }
}

impl std::fmt::Display for Wall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.first, self.second)
    }
}

/// Width and height of a grid. Both are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    width: usize,
    height: usize,
}

impl GridShape {
    /// Create a new grid shape.
    pub fn new(width: usize, height: usize) -> Result<Self, MazeError> {
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidGridShape { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width of the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Whether a position lies inside the grid.
    pub fn contains(&self, pos: &Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Convert a position into `(col, row)` indices, or fail if it is outside the grid.
    pub fn index_of(&self, pos: &Position) -> Result<(usize, usize), MazeError> {
        if self.contains(pos) {
            Ok((pos.x as usize, pos.y as usize))
        } else {
            Err(MazeError::OutOfBounds(*pos))
        }
    }

    /// All positions, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }
}

/// A maze: the connectivity graph of a walled grid plus its reward field.
#[derive(Debug, Clone)]
pub struct Maze {
    grid_shape: GridShape,
    walls: HashSet<Wall>,
    connectivity: HashMap<Position, HashSet<Position>>,
    rewards: Grid<u8>,
    reward_chance: f64,
}

impl Maze {
    /// Create a new maze. The full lattice is built first, then the walls are applied in order,
    /// then rewards are drawn with probability `reward_chance` per cell.
    pub fn new<R>(
        width: usize,
        height: usize,
        walls: impl IntoIterator<Item = Wall>,
        reward_chance: f64,
        rng: &mut R,
    ) -> Result<Self, MazeError>
    where
        R: Rng + ?Sized,
    {
        let grid_shape = GridShape::new(width, height)?;
        let mut maze = Self {
            grid_shape,
            walls: HashSet::default(),
            connectivity: full_connectivity(&grid_shape),
            rewards: Grid::filled(grid_shape, 0),
            reward_chance,
        };
        maze.add_walls(walls)?;
        maze.generate_reward(reward_chance, rng)?;
        debug!(
            width,
            height,
            walls = maze.walls.len(),
            reward_chance,
            "built maze"
        );
        Ok(maze)
    }

    /// Shape of the grid.
    pub fn grid_shape(&self) -> GridShape {
        self.grid_shape
    }

    /// Whether a position lies inside the maze.
    pub fn is_valid(&self, pos: &Position) -> bool {
        self.grid_shape.contains(pos)
    }

    /// Walls added so far.
    pub fn walls(&self) -> &HashSet<Wall> {
        &self.walls
    }

    /// The whole connectivity graph.
    pub fn connectivity(&self) -> &HashMap<Position, HashSet<Position>> {
        &self.connectivity
    }

    /// Probability used for the last reward draw.
    pub fn reward_chance(&self) -> f64 {
        self.reward_chance
    }

    /// Cells reachable from `pos` in one step.
    pub fn neighbors(&self, pos: &Position) -> Result<&HashSet<Position>, MazeError> {
        self.connectivity
            .get(pos)
            .ok_or(MazeError::OutOfBounds(*pos))
    }

    /// Number of cells reachable from `pos` in one step.
    pub fn degree(&self, pos: &Position) -> Result<usize, MazeError> {
        self.neighbors(pos).map(|n| n.len())
    }

    /// Degree of every cell.
    pub fn degree_grid(&self) -> Grid<usize> {
        Grid::from_fn(self.grid_shape, |pos| {
            self.connectivity.get(&pos).map_or(0, |n| n.len())
        })
    }

    /// Add a wall, removing the edge between its two cells in both directions.
    ///
    /// Walls are not idempotent: adding a wall whose edge is already gone fails with
    /// [`MazeError::EdgeNotFound`].
    pub fn add_wall(&mut self, wall: Wall) -> Result<(), MazeError> {
        let (a, b) = wall.cells();
        if !self.is_valid(&a) || !self.is_valid(&b) || !a.is_adjacent(&b) {
            return Err(MazeError::InvalidWall(wall));
        }

        let removed = match self.connectivity.get_mut(&a) {
            Some(neighbors) => neighbors.remove(&b),
            None => false,
        };
        if !removed {
            return Err(MazeError::EdgeNotFound(wall));
        }
        if let Some(neighbors) = self.connectivity.get_mut(&b) {
            neighbors.remove(&a);
        }

        self.walls.insert(wall);
        debug!(%wall, "added wall");
        Ok(())
    }

    /// Add walls in order. Stops at the first wall that fails; walls before it stay applied.
    pub fn add_walls(&mut self, walls: impl IntoIterator<Item = Wall>) -> Result<(), MazeError> {
        for wall in walls {
            self.add_wall(wall)?;
        }
        Ok(())
    }

    /// Redraw the reward of every cell: 1 with probability `chance`, else 0.
    pub fn generate_reward<R>(&mut self, chance: f64, rng: &mut R) -> Result<(), MazeError>
    where
        R: Rng + ?Sized,
    {
        if !(0.0..=1.0).contains(&chance) {
            return Err(MazeError::InvalidRewardChance(chance));
        }
        self.rewards = Grid::from_fn(self.grid_shape, |_| u8::from(rng.gen_bool(chance)));
        self.reward_chance = chance;
        Ok(())
    }

    /// Reward at `pos`, either 0 or 1.
    pub fn reward_at(&self, pos: &Position) -> Result<u8, MazeError> {
        let (col, row) = self.grid_shape.index_of(pos)?;
        Ok(*self.rewards.get(col, row))
    }

    /// The whole reward field.
    pub fn reward_grid(&self) -> &Grid<u8> {
        &self.rewards
    }
}

// Every cell joined to its in-bounds axis neighbours.
fn full_connectivity(grid_shape: &GridShape) -> HashMap<Position, HashSet<Position>> {
    grid_shape
        .positions()
        .map(|pos| {
            let neighbors = pos
                .axis_neighbors()
                .into_iter()
                .filter(|n| grid_shape.contains(n))
                .collect();
            (pos, neighbors)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;

    use super::*;

    fn rng() -> rand_pcg::Pcg64 {
        rand_pcg::Pcg64::seed_from_u64(42)
    }

    fn open_maze(width: usize, height: usize) -> Maze {
        Maze::new(width, height, [], 0.0, &mut rng()).expect("valid maze")
    }

    fn wall(a: (i32, i32), b: (i32, i32)) -> Wall {
        Wall::new(a.into(), b.into())
    }

    fn is_symmetric(maze: &Maze) -> bool {
        maze.connectivity().iter().all(|(p, neighbors)| {
            neighbors
                .iter()
                .all(|q| maze.neighbors(q).map_or(false, |back| back.contains(p)))
        })
    }

    #[test]
    fn test_full_lattice_degrees() {
        let maze = open_maze(3, 3);
        let degrees = maze.degree_grid();
        assert_eq!(*degrees.get(0, 0), 2);
        assert_eq!(*degrees.get(1, 0), 3);
        assert_eq!(*degrees.get(2, 2), 2);
        assert_eq!(*degrees.get(0, 1), 3);
        assert_eq!(*degrees.get(1, 1), 4);
    }

    #[test]
    fn test_neighbors_are_clipped_at_boundary() {
        let maze = open_maze(3, 1);
        let neighbors = maze.neighbors(&Position::new(0, 0)).expect("in bounds");
        assert_eq!(neighbors.len(), 1);
        assert!(neighbors.contains(&Position::new(1, 0)));
    }

    #[test]
    fn test_neighbors_out_of_bounds() {
        let maze = open_maze(2, 2);
        for pos in [(-1, 0), (0, -1), (2, 0), (0, 2)] {
            let pos = Position::from(pos);
            assert_eq!(maze.neighbors(&pos), Err(MazeError::OutOfBounds(pos)));
            assert_eq!(maze.degree(&pos), Err(MazeError::OutOfBounds(pos)));
        }
    }

    #[test]
    fn test_wall_is_unordered() {
        assert_eq!(wall((0, 0), (1, 0)), wall((1, 0), (0, 0)));
    }

    #[test]
    fn test_add_wall_removes_edge_both_ways() {
        let mut maze = open_maze(2, 2);
        maze.add_wall(wall((0, 0), (1, 0))).expect("add wall failed");

        let a = Position::new(0, 0);
        let b = Position::new(1, 0);
        assert!(!maze.neighbors(&a).unwrap().contains(&b));
        assert!(!maze.neighbors(&b).unwrap().contains(&a));
        assert_eq!(maze.degree(&a), Ok(1));
        assert_eq!(maze.degree(&b), Ok(1));
        assert!(maze.walls().contains(&wall((1, 0), (0, 0))));
        assert!(is_symmetric(&maze));
    }

    #[test]
    fn test_duplicate_wall_is_edge_not_found() {
        let mut maze = open_maze(2, 2);
        maze.add_wall(wall((0, 0), (0, 1))).expect("add wall failed");
        assert_eq!(
            maze.add_wall(wall((0, 0), (0, 1))),
            Err(MazeError::EdgeNotFound(wall((0, 0), (0, 1))))
        );
        assert_eq!(
            maze.add_wall(wall((0, 1), (0, 0))),
            Err(MazeError::EdgeNotFound(wall((0, 0), (0, 1))))
        );
        assert_eq!(maze.walls().len(), 1);
    }

    #[test]
    fn test_invalid_walls_are_rejected_and_not_recorded() {
        let mut maze = open_maze(3, 3);
        let invalid = [
            wall((0, 0), (1, 1)),
            wall((0, 0), (2, 0)),
            wall((0, 0), (0, 0)),
            wall((2, 2), (3, 2)),
            wall((-1, 0), (0, 0)),
        ];
        for w in invalid {
            assert_eq!(maze.add_wall(w), Err(MazeError::InvalidWall(w)));
        }
        assert!(maze.walls().is_empty());
        assert_eq!(maze.degree_grid(), open_maze(3, 3).degree_grid());
    }

    #[test]
    fn test_add_walls_stops_at_first_failure() {
        let mut maze = open_maze(3, 1);
        let result = maze.add_walls([
            wall((0, 0), (1, 0)),
            wall((0, 0), (1, 0)),
            wall((1, 0), (2, 0)),
        ]);
        assert_eq!(result, Err(MazeError::EdgeNotFound(wall((0, 0), (1, 0)))));
        assert_eq!(maze.walls().len(), 1);
        assert_eq!(maze.degree(&Position::new(2, 0)), Ok(1));
    }

    #[test]
    fn test_new_with_duplicate_walls_fails() {
        let walls = vec![wall((0, 0), (1, 0)), wall((1, 0), (0, 0))];
        assert_eq!(
            Maze::new(2, 1, walls, 0.0, &mut rng()).map(|_| ()),
            Err(MazeError::EdgeNotFound(wall((0, 0), (1, 0))))
        );
    }

    #[test]
    fn test_new_rejects_bad_shape_and_chance() {
        assert_eq!(
            Maze::new(0, 3, [], 0.0, &mut rng()).map(|_| ()),
            Err(MazeError::InvalidGridShape {
                width: 0,
                height: 3
            })
        );
        assert_eq!(
            Maze::new(2, 2, [], 1.5, &mut rng()).map(|_| ()),
            Err(MazeError::InvalidRewardChance(1.5))
        );
        assert_eq!(
            Maze::new(2, 2, [], -0.1, &mut rng()).map(|_| ()),
            Err(MazeError::InvalidRewardChance(-0.1))
        );
    }

    #[test]
    fn test_reward_chance_zero_and_one() {
        let mut rng = rng();
        let mut maze = Maze::new(4, 3, [], 0.0, &mut rng).expect("valid maze");
        assert!(maze.reward_grid().iter().all(|r| *r == 0));

        maze.generate_reward(1.0, &mut rng).expect("valid chance");
        assert!(maze.reward_grid().iter().all(|r| *r == 1));
        for pos in maze.grid_shape().positions() {
            assert_eq!(maze.reward_at(&pos), Ok(1));
        }
    }

    #[test]
    fn test_reward_at_out_of_bounds() {
        let maze = open_maze(2, 2);
        let pos = Position::new(2, 1);
        assert_eq!(maze.reward_at(&pos), Err(MazeError::OutOfBounds(pos)));
    }

    #[test]
    fn test_seeded_rewards_are_reproducible() {
        let a = Maze::new(5, 5, [], 0.5, &mut rng()).expect("valid maze");
        let b = Maze::new(5, 5, [], 0.5, &mut rng()).expect("valid maze");
        assert_eq!(a.reward_grid(), b.reward_grid());
    }

    fn candidate_walls() -> impl Strategy<Value = Vec<(i32, i32, bool)>> {
        prop::collection::vec((0..6i32, 0..6i32, any::<bool>()), 0..20)
    }

    proptest! {
        #[test]
        fn test_connectivity_stays_symmetric(
            width in 1..6usize,
            height in 1..6usize,
            candidates in candidate_walls(),
        ) {
            let mut maze = open_maze(width, height);
            prop_assert!(is_symmetric(&maze));
            for (x, y, horizontal) in candidates {
                let a = Position::new(x, y);
                let b = if horizontal { Position::new(x + 1, y) } else { Position::new(x, y + 1) };
                let before = maze.walls().len();
                match maze.add_wall(Wall::new(a, b)) {
                    Ok(()) => {
                        prop_assert_eq!(maze.walls().len(), before + 1);
                    }
                    Err(_) => {
                        prop_assert_eq!(maze.walls().len(), before);
                    }
                }
                prop_assert!(is_symmetric(&maze));
            }
        }

        #[test]
        fn test_rewards_are_binary(
            chance in 0.0..=1.0f64,
            seed in any::<u64>(),
        ) {
            let mut rng = rand_pcg::Pcg64::seed_from_u64(seed);
            let maze = Maze::new(4, 4, [], chance, &mut rng).expect("valid maze");
            prop_assert!(maze.reward_grid().iter().all(|r| *r == 0 || *r == 1));
        }
    }
}
