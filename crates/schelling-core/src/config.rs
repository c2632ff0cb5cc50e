//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Side length of the square grid
    pub size: usize,
    /// Chebyshev radius of the neighborhood window
    pub neighborhood_distance: usize,
    /// Fraction of squares left vacant (0.0 to 1.0)
    pub fraction_vacant: f64,
    /// Fraction of residents that are red / type A (0.0 to 1.0)
    pub fraction_red: f64,
    /// Minimum same-type neighbor fraction for a happy resident (0.0 to 1.0)
    pub happiness_threshold: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 20,
            neighborhood_distance: 1,
            fraction_vacant: 0.2,
            fraction_red: 0.5,
            happiness_threshold: 0.25,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::Validation("grid size must be positive".to_string()));
        }
        check_fraction("fraction_vacant", self.fraction_vacant)?;
        check_fraction("fraction_red", self.fraction_red)?;
        check_fraction("happiness_threshold", self.happiness_threshold)
    }
}

/// Checks that a named value is a finite fraction in [0, 1]
pub fn check_fraction(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::Validation(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Simulation run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of steps to advance the grid
    pub num_steps: u64,
    /// Each step runs the diagonal sweep with odds 1 in `sweep_odds`,
    /// otherwise the greedy group step
    pub sweep_odds: u32,
    /// Stop early once every resident is happy
    pub stop_when_settled: bool,
    /// Grid configuration
    pub grid: GridConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_steps: 40,
            sweep_odds: 6,
            stop_when_settled: false,
            grid: GridConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sweep_odds == 0 {
            return Err(Error::Validation("sweep_odds must be positive".to_string()));
        }
        self.grid.validate()
    }
}

/// Batch runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Experiment template; replicate `i` runs with `seed + i`
    pub experiment: SimulationConfig,
    /// Number of independent replicates
    pub replicates: u32,
    /// Log a progress line every this many steps (0 disables)
    pub log_every: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            experiment: SimulationConfig::default(),
            replicates: 1,
            log_every: 10,
        }
    }
}

impl RunnerConfig {
    /// Load a JSON runner configuration from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RunnerConfig = serde_json::from_str(&text)?;
        config.experiment.validate()?;
        Ok(config)
    }
}
