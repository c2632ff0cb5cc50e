//! Square grid of residents and vacancies.

use crate::population::{self, PopulationCounts};
use schelling_core::{check_fraction, Cell, Coord, Error, GridConfig, GridStats, Move, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Same-type, other-type and vacant counts in a neighborhood window,
/// the center square excluded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborCounts {
    pub same: usize,
    pub other: usize,
    pub vacant: usize,
}

impl NeighborCounts {
    pub fn total(&self) -> usize {
        self.same + self.other + self.vacant
    }

    /// Fraction of neighbors sharing the center's type. A square with no
    /// neighbors at all counts as fully surrounded by its own kind.
    pub fn same_fraction(&self) -> f64 {
        match self.total() {
            0 => 1.0,
            total => self.same as f64 / total as f64,
        }
    }
}

/// A fixed-size square grid. Storage is row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    size: usize,
    neighborhood_distance: usize,
    happiness_threshold: f64,
    cells: Vec<Cell>,
}

/// Unchecked wire form of a [`Grid`]
#[derive(Deserialize)]
struct RawGrid {
    size: usize,
    neighborhood_distance: usize,
    happiness_threshold: f64,
    cells: Vec<Cell>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = Error;

    fn try_from(raw: RawGrid) -> Result<Self> {
        if raw.size == 0 {
            return Err(Error::Validation("grid size must be positive".to_string()));
        }
        check_fraction("happiness_threshold", raw.happiness_threshold)?;
        let expected = raw.size.checked_mul(raw.size);
        if expected != Some(raw.cells.len()) {
            return Err(Error::Validation(format!(
                "grid of size {} needs {} cells, got {}",
                raw.size,
                raw.size.saturating_mul(raw.size),
                raw.cells.len()
            )));
        }

        Ok(Self {
            size: raw.size,
            neighborhood_distance: raw.neighborhood_distance,
            happiness_threshold: raw.happiness_threshold,
            cells: raw.cells,
        })
    }
}

impl Grid {
    /// Create an all-vacant grid
    pub fn new(size: usize, neighborhood_distance: usize, happiness_threshold: f64) -> Self {
        Self {
            size,
            neighborhood_distance,
            happiness_threshold,
            cells: vec![Cell::Vacant; size * size],
        }
    }

    /// Create a grid from configuration with a random initial population
    pub fn from_config<R: Rng + ?Sized>(config: &GridConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let mut grid = Self::new(
            config.size,
            config.neighborhood_distance,
            config.happiness_threshold,
        );
        let counts = PopulationCounts::from_fractions(
            config.size * config.size,
            config.fraction_vacant,
            config.fraction_red,
        );
        population::fill(&mut grid.cells, config.size, counts, rng);

        Ok(grid)
    }

    /// Re-randomize the population in place and replace the happiness threshold.
    /// Size and neighborhood distance are kept.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        fraction_vacant: f64,
        fraction_red: f64,
        happiness_threshold: f64,
        rng: &mut R,
    ) -> Result<()> {
        check_fraction("fraction_vacant", fraction_vacant)?;
        check_fraction("fraction_red", fraction_red)?;
        check_fraction("happiness_threshold", happiness_threshold)?;

        self.happiness_threshold = happiness_threshold;
        let counts =
            PopulationCounts::from_fractions(self.cells.len(), fraction_vacant, fraction_red);
        population::fill(&mut self.cells, self.size, counts, rng);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn neighborhood_distance(&self) -> usize {
        self.neighborhood_distance
    }

    pub fn happiness_threshold(&self) -> f64 {
        self.happiness_threshold
    }

    /// Parameters of this grid, with fractions taken from its current population
    pub fn to_config(&self) -> GridConfig {
        let vacant = self.count(Cell::Vacant);
        let type_a = self.count(Cell::TypeA);
        let residents = self.cells.len() - vacant;

        GridConfig {
            size: self.size,
            neighborhood_distance: self.neighborhood_distance,
            fraction_vacant: match self.cells.len() {
                0 => 0.0,
                total => vacant as f64 / total as f64,
            },
            fraction_red: match residents {
                0 => 0.0,
                residents => type_a as f64 / residents as f64,
            },
            happiness_threshold: self.happiness_threshold,
        }
    }

    /// Cell state at (row, col), `None` when out of bounds
    pub fn get_color(&self, row: i32, col: i32) -> Option<Cell> {
        let coord = Coord::new(row, col);
        coord.in_bounds(self.size).then(|| self.at(coord))
    }

    /// Set the cell at (row, col). Returns false, leaving the grid untouched,
    /// when the coordinate is out of bounds.
    pub fn set_color(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        let coord = Coord::new(row, col);
        if !coord.in_bounds(self.size) {
            return false;
        }
        self.put(coord, cell);
        true
    }

    /// Set the cell at (row, col) from a raw code (0 vacant, 1 type A, 2 type B).
    /// Out of bounds yields `Ok(false)`; an unknown code is `Error::InvalidState`.
    pub fn set_color_code(&mut self, row: i32, col: i32, code: u8) -> Result<bool> {
        if !Coord::new(row, col).in_bounds(self.size) {
            return Ok(false);
        }
        let cell = Cell::try_from(code)?;
        Ok(self.set_color(row, col, cell))
    }

    /// Cycle the cell Vacant -> TypeA -> TypeB -> Vacant. Returns false when
    /// out of bounds.
    pub fn shift_color(&mut self, row: i32, col: i32) -> bool {
        let coord = Coord::new(row, col);
        if !coord.in_bounds(self.size) {
            return false;
        }
        let next = self.at(coord).next();
        self.put(coord, next);
        true
    }

    /// Neighbor counts for the resident at (row, col); `None` for vacant or
    /// out-of-bounds squares
    pub fn neighborhood(&self, row: i32, col: i32) -> Option<NeighborCounts> {
        let coord = Coord::new(row, col);
        if !coord.in_bounds(self.size) || self.at(coord).is_vacant() {
            return None;
        }
        Some(self.neighbor_counts(coord))
    }

    /// Whether the resident at (row, col) meets the happiness threshold.
    /// Vacant and out-of-bounds squares are never happy.
    pub fn is_happy(&self, row: i32, col: i32) -> bool {
        self.neighborhood(row, col)
            .map_or(false, |counts| counts.same_fraction() >= self.happiness_threshold)
    }

    /// Fraction of residents that are happy; 1.0 on a grid with no residents
    pub fn fraction_happy(&self) -> f64 {
        self.stats().fraction_happy
    }

    /// Number of squares holding `cell`
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Population and happiness snapshot in a single scan
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            size: self.size,
            ..Default::default()
        };

        for (coord, cell) in self.iter() {
            match cell {
                Cell::Vacant => {
                    stats.vacant += 1;
                    continue;
                }
                Cell::TypeA => stats.type_a += 1,
                Cell::TypeB => stats.type_b += 1,
            }
            if self.is_happy_at(coord) {
                stats.happy += 1;
            } else {
                stats.unhappy += 1;
            }
        }

        stats.fraction_happy = match stats.residents() {
            0 => 1.0,
            residents => stats.happy as f64 / residents as f64,
        };
        stats
    }

    /// Iterator over all squares in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &cell)| (self.index_to_coord(i), cell))
    }

    pub(crate) fn at(&self, coord: Coord) -> Cell {
        self.cells[self.coord_to_index(coord)]
    }

    pub(crate) fn put(&mut self, coord: Coord, cell: Cell) {
        let index = self.coord_to_index(coord);
        self.cells[index] = cell;
    }

    /// Happiness of an in-bounds resident square
    pub(crate) fn is_happy_at(&self, coord: Coord) -> bool {
        self.neighbor_counts(coord).same_fraction() >= self.happiness_threshold
    }

    /// Move the resident at `from` into the vacancy at `to`
    pub(crate) fn relocate(&mut self, from: Coord, to: Coord) -> Move {
        let cell = self.at(from);
        debug_assert!(cell.is_resident(), "relocating from vacant square {}", from);
        debug_assert!(self.at(to).is_vacant(), "relocating onto occupied square {}", to);

        self.put(to, cell);
        self.put(from, Cell::Vacant);
        Move { from, to, cell }
    }

    /// Scan the window of Chebyshev radius `neighborhood_distance` clamped to
    /// the grid, skipping the center square itself
    fn neighbor_counts(&self, coord: Coord) -> NeighborCounts {
        let center = self.at(coord);
        let (row, col) = (coord.row as usize, coord.col as usize);
        let d = self.neighborhood_distance;
        let last = self.size - 1;

        let mut counts = NeighborCounts::default();
        for r in row.saturating_sub(d)..=(row.saturating_add(d)).min(last) {
            for c in col.saturating_sub(d)..=(col.saturating_add(d)).min(last) {
                if r == row && c == col {
                    continue;
                }
                match self.cells[r * self.size + c] {
                    Cell::Vacant => counts.vacant += 1,
                    other if other == center => counts.same += 1,
                    _ => counts.other += 1,
                }
            }
        }
        counts
    }

    fn coord_to_index(&self, coord: Coord) -> usize {
        coord.row as usize * self.size + coord.col as usize
    }

    fn index_to_coord(&self, index: usize) -> Coord {
        Coord::new((index / self.size) as i32, (index % self.size) as i32)
    }

    /// Build a grid from text rows of '.', 'R' and 'B'
    #[cfg(test)]
    pub(crate) fn from_rows(rows: &[&str], neighborhood_distance: usize, threshold: f64) -> Self {
        let mut grid = Self::new(rows.len(), neighborhood_distance, threshold);
        for (r, line) in rows.iter().enumerate() {
            assert_eq!(line.len(), rows.len(), "row {} is not square", r);
            for (c, symbol) in line.chars().enumerate() {
                let cell = match symbol {
                    '.' => Cell::Vacant,
                    'R' => Cell::TypeA,
                    'B' => Cell::TypeB,
                    other => panic!("unknown symbol {:?}", other),
                };
                grid.put(Coord::new(r as i32, c as i32), cell);
            }
        }
        grid
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size.max(1)) {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
