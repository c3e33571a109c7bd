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

use serde::{Deserialize, Serialize};

use crate::{GridShape, Position};

/// A value per cell, stored row by row. Used for rewards, degrees, reachable-cell counts,
/// empowerment and averaged experiment rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    cells: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `value`.
    pub fn filled(grid_shape: GridShape, value: T) -> Self {
        Self {
            cells: vec![value; grid_shape.cell_count()],
            width: grid_shape.width(),
            height: grid_shape.height(),
        }
    }
}

impl<T> Grid<T> {
    /// Create a grid by calling `f` for each position, row by row.
    pub fn from_fn(grid_shape: GridShape, f: impl FnMut(Position) -> T) -> Self {
        Self {
            cells: grid_shape.positions().map(f).collect(),
            width: grid_shape.width(),
            height: grid_shape.height(),
        }
    }

    /// Like [`Grid::from_fn`], but stops at the first error.
    pub fn try_from_fn<E>(
        grid_shape: GridShape,
        f: impl FnMut(Position) -> Result<T, E>,
    ) -> Result<Self, E> {
        Ok(Self {
            cells: grid_shape.positions().map(f).collect::<Result<_, _>>()?,
            width: grid_shape.width(),
            height: grid_shape.height(),
        })
    }

    /// Width of the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get a cell. Panics if `col` or `row` is out of range.
    pub fn get(&self, col: usize, row: usize) -> &T {
        &self.cells[row * self.width + col]
    }

    /// Get a mutable cell. Panics if `col` or `row` is out of range.
    pub fn get_mut(&mut self, col: usize, row: usize) -> &mut T {
        &mut self.cells[row * self.width + col]
    }

    /// All cells, row by row.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Apply `f` to every cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            cells: self.cells.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

// One row per line, cells separated by spaces. A precision such as `{:.2}` is passed on to each
// cell.
impl<T: std::fmt::Display> std::fmt::Display for Grid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                if col > 0 {
                    write!(f, " ")?;
                }
                let cell = self.get(col, row);
                match f.precision() {
                    Some(precision) => write!(f, "{:.*}", precision, cell)?,
                    None => write!(f, "{}", cell)?,
                }
            }
            if row < self.height - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_row_major() {
        let shape = GridShape::new(3, 2).unwrap();
        let grid = Grid::from_fn(shape, |pos| pos.x + 10 * pos.y);
        assert_eq!(*grid.get(0, 0), 0);
        assert_eq!(*grid.get(2, 0), 2);
        assert_eq!(*grid.get(0, 1), 10);
        assert_eq!(*grid.get(2, 1), 12);
        assert_eq!(grid.iter().copied().collect::<Vec<_>>(), [0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_try_from_fn_stops_on_error() {
        let shape = GridShape::new(2, 2).unwrap();
        let result: Result<Grid<i32>, String> = Grid::try_from_fn(shape, |pos| {
            if pos.y == 1 {
                Err(format!("bad row at {}", pos))
            } else {
                Ok(pos.x)
            }
        });
        assert_eq!(result, Err("bad row at (0, 1)".to_string()));
    }

    #[test]
    fn test_display_with_precision() {
        let shape = GridShape::new(2, 2).unwrap();
        let mut grid = Grid::filled(shape, 0.0f64);
        *grid.get_mut(1, 0) = 1.5;
        *grid.get_mut(0, 1) = 2.3;
        assert_eq!(format!("{:.1}", grid), "0.0 1.5\n2.3 0.0");
        assert_eq!(format!("{}", grid.map(|v| *v as i32)), "0 1\n2 0");
    }
}
