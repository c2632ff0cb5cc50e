//! Random population assignment.

use rand::Rng;
use schelling_core::Cell;
use serde::{Deserialize, Serialize};

/// Exact number of squares of each kind to place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub type_a: usize,
    pub type_b: usize,
    pub vacant: usize,
}

impl PopulationCounts {
    /// Target counts for `squares` squares from direct fractions in [0, 1].
    ///
    /// `vacant = round(squares * fraction_vacant)` and
    /// `type_a = round((1 - fraction_vacant) * squares * fraction_red)`; type B
    /// takes the remainder. Rounding both halves up can overshoot by one, so
    /// type A is capped at what the vacancies leave over.
    pub fn from_fractions(squares: usize, fraction_vacant: f64, fraction_red: f64) -> Self {
        let n = squares as f64;
        let vacant = ((n * fraction_vacant).round() as usize).min(squares);
        let type_a =
            ((((1.0 - fraction_vacant) * n * fraction_red).round()) as usize).min(squares - vacant);

        Self {
            type_a,
            type_b: squares - vacant - type_a,
            vacant,
        }
    }

    pub fn total(&self) -> usize {
        self.type_a + self.type_b + self.vacant
    }
}

/// Fill `cells` (row-major, `size` wide) with exactly `counts` squares of each
/// kind, visiting positions column by column.
///
/// Each position draws uniformly from the tokens still left to place, which is
/// a uniform shuffle of the multiset of A, B and vacancy tokens.
pub(crate) fn fill<R: Rng + ?Sized>(
    cells: &mut [Cell],
    size: usize,
    counts: PopulationCounts,
    rng: &mut R,
) {
    debug_assert_eq!(cells.len(), size * size);
    debug_assert_eq!(counts.total(), cells.len());

    let mut left = counts;
    for i in 0..cells.len() {
        let (row, col) = (i % size, i / size);

        // draw over [ A | B | vacant ]
        let remaining = left.type_a + left.type_b + left.vacant;
        let x = rng.gen_range(0..remaining);
        let cell = if x < left.type_a {
            left.type_a -= 1;
            Cell::TypeA
        } else if x >= left.type_a + left.type_b {
            left.vacant -= 1;
            Cell::Vacant
        } else {
            left.type_b -= 1;
            Cell::TypeB
        };

        cells[row * size + col] = cell;
    }
}
