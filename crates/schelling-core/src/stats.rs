//! Happiness and population statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of the grid population and its happiness
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    pub size: usize,
    pub type_a: usize,
    pub type_b: usize,
    pub vacant: usize,
    pub happy: usize,
    pub unhappy: usize,
    /// happy / (type_a + type_b), 1.0 when there are no residents
    pub fraction_happy: f64,
}

impl GridStats {
    pub fn residents(&self) -> usize {
        self.type_a + self.type_b
    }

    pub fn total(&self) -> usize {
        self.residents() + self.vacant
    }

    pub fn is_settled(&self) -> bool {
        self.unhappy == 0
    }
}

/// Relocation algorithm applied in a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    /// Unhappy residents move to uniformly random vacancies
    Random,
    /// Greedy satisfy-if-possible pass, leftovers moved at random
    Group,
    /// Anti-diagonal sweep sorting residents toward their corner
    DiagonalSweep,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Random => "random",
            StepKind::Group => "group",
            StepKind::DiagonalSweep => "diagonal_sweep",
        };
        write!(f, "{}", name)
    }
}

/// Record of one simulation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: u64,
    pub kind: StepKind,
    pub moves: usize,
    pub fraction_happy: f64,
}

/// Statistics aggregated across replicate runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicateStats {
    pub runs: u32,
    pub settled_runs: u32,
    pub avg_steps: f64,
    pub avg_fraction_happy: f64,
    pub min_fraction_happy: f64,
    pub max_fraction_happy: f64,
}

impl ReplicateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the outcome of one replicate
    pub fn update(&mut self, steps_run: u64, final_stats: &GridStats) {
        let n = self.runs as f64;
        let new_n = n + 1.0;
        let happy = final_stats.fraction_happy;

        // Incremental means
        self.avg_steps = (self.avg_steps * n + steps_run as f64) / new_n;
        self.avg_fraction_happy = (self.avg_fraction_happy * n + happy) / new_n;

        if self.runs == 0 {
            self.min_fraction_happy = happy;
            self.max_fraction_happy = happy;
        } else {
            self.min_fraction_happy = self.min_fraction_happy.min(happy);
            self.max_fraction_happy = self.max_fraction_happy.max(happy);
        }

        if final_stats.is_settled() {
            self.settled_runs += 1;
        }
        self.runs += 1;
    }
}
