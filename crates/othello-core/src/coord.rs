//! Board coordinates and compass directions for the 8x8 grid.
//!
//! This module provides the foundational addressing types for the board:
//! - `Coord`: identifies a single square as (x, y)
//! - `Direction`: one of the eight compass directions used for line scans
//!
//! `Coord` is the canonical coordinate system for every engine input and
//! output: x is the column (0-7, left to right) and y is the row (0-7, top to
//! bottom). Presentation layers that think in screen row/column order convert
//! at their own boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length of the board in squares.
pub const BOARD_SIZE: usize = 8;

/// A square on the board, addressed as (x, y).
///
/// Serializes as the two-element array `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u8, u8)", into = "(u8, u8)")]
pub struct Coord {
    /// Column, 0-7 from the left edge
    pub x: u8,
    /// Row, 0-7 from the top edge
    pub y: u8,
}

impl Coord {
    /// Create a coordinate. Values outside 0-7 are representable but refer
    /// to no square; `Board::contains` is the bounds check.
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// The square one step away in `direction`, or `None` when the step
    /// leaves the board.
    pub fn step(&self, direction: Direction) -> Option<Coord> {
        let (dx, dy) = direction.delta();
        let x = self.x as i16 + dx as i16;
        let y = self.y as i16 + dy as i16;
        if (0..BOARD_SIZE as i16).contains(&x) && (0..BOARD_SIZE as i16).contains(&y) {
            Some(Coord::new(x as u8, y as u8))
        } else {
            None
        }
    }
}

impl From<(u8, u8)> for Coord {
    fn from((x, y): (u8, u8)) -> Self {
        Coord::new(x, y)
    }
}

impl From<Coord> for (u8, u8) {
    fn from(coord: Coord) -> Self {
        (coord.x, coord.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A compass direction on the grid. North is toward row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// All eight directions in the fixed scan order: N, NE, E, SE, S, SW, W,
    /// NW. Line scans iterate this order so results are deterministic.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The (dx, dy) offset of one step in this direction.
    pub fn delta(&self) -> (i8, i8) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }
}
