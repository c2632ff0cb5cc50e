//! Core type definitions for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an experiment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentId(pub Uuid);

impl ExperimentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExperimentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a single grid square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Vacant,
    /// Red resident
    TypeA,
    /// Blue resident
    TypeB,
}

impl Cell {
    /// Next state in the Vacant -> TypeA -> TypeB -> Vacant cycle
    pub fn next(self) -> Self {
        match self {
            Cell::Vacant => Cell::TypeA,
            Cell::TypeA => Cell::TypeB,
            Cell::TypeB => Cell::Vacant,
        }
    }

    pub fn is_vacant(self) -> bool {
        self == Cell::Vacant
    }

    pub fn is_resident(self) -> bool {
        !self.is_vacant()
    }
}

impl TryFrom<u8> for Cell {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Cell::Vacant),
            1 => Ok(Cell::TypeA),
            2 => Ok(Cell::TypeB),
            other => Err(Error::InvalidState(format!(
                "cell code {} is not vacant (0), type A (1) or type B (2)",
                other
            ))),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Cell::Vacant => '.',
            Cell::TypeA => 'R',
            Cell::TypeB => 'B',
        };
        write!(f, "{}", symbol)
    }
}

/// (row, col) position on the grid, 0-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Valid iff both components lie in [0, size)
    pub fn in_bounds(&self, size: usize) -> bool {
        self.row >= 0 && self.col >= 0 && (self.row as usize) < size && (self.col as usize) < size
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A resident relocated from one square to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
    pub cell: Cell,
}
