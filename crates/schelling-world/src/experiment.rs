//! Experiment jobs for batch runs.

use crate::simulation::{Simulation, SimulationResult};
use schelling_core::{ExperimentId, Result, SimulationConfig};
use serde::{Deserialize, Serialize};

/// A self-contained simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ExperimentId,
    pub config: SimulationConfig,
}

impl Experiment {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            id: ExperimentId::new(),
            config,
        }
    }

    /// `count` experiments sharing a template, replicate `i` seeded with `seed + i`
    pub fn replicates(template: &SimulationConfig, count: u32) -> Vec<Self> {
        (0..count)
            .map(|i| {
                Self::new(SimulationConfig {
                    seed: template.seed.wrapping_add(i as u64),
                    ..template.clone()
                })
            })
            .collect()
    }

    /// Execute this experiment
    pub fn execute(self) -> Result<ExperimentResult> {
        let mut simulation = Simulation::new(self.config)?;
        let result = simulation.run();

        Ok(ExperimentResult {
            id: self.id,
            result,
        })
    }
}

/// Result from executing an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub id: ExperimentId,
    pub result: SimulationResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use schelling_core::GridConfig;

    fn template() -> SimulationConfig {
        SimulationConfig {
            seed: 100,
            num_steps: 10,
            grid: GridConfig {
                size: 8,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_replicate_seeds() {
        let jobs = Experiment::replicates(&template(), 3);
        let seeds: Vec<u64> = jobs.iter().map(|j| j.config.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102]);
        assert_ne!(jobs[0].id, jobs[1].id);
        assert!(jobs.iter().all(|j| j.config.grid.size == 8));
    }

    #[test]
    fn test_experiment_execution() {
        let experiment = Experiment::new(template());
        let id = experiment.id;
        let outcome = experiment.execute().unwrap();

        assert_eq!(outcome.id, id);
        assert_eq!(outcome.result.seed, 100);
        assert_eq!(outcome.result.steps_run, 10);
        assert_eq!(outcome.result.final_stats.total(), 64);
    }

    #[test]
    fn test_invalid_experiment_fails() {
        let mut config = template();
        config.grid.fraction_vacant = 2.0;
        assert!(Experiment::new(config).execute().is_err());
    }

    #[test]
    fn test_result_serialization() {
        let outcome = Experiment::new(template()).execute().unwrap();
        let json = serde_json::to_string(&outcome).unwrap();
        let deserialized: ExperimentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, outcome.id);
        assert_eq!(deserialized.result, outcome.result);
    }
}
