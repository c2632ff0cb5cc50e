//! Simulation engine that advances a grid over discrete steps.

use crate::grid::Grid;
use crate::relocation::{self, RelocationOutcome};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use schelling_core::{GridStats, Result, SimulationConfig, StepKind, StepSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

pub struct Simulation {
    grid: Grid,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    step: u64,
    history: Vec<StepSummary>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = Grid::from_config(&config.grid, &mut rng)?;

        Ok(Self {
            grid,
            config,
            rng,
            step: 0,
            history: Vec::new(),
        })
    }

    /// Drive an existing grid. The grid section of `config` is replaced by
    /// the grid's own parameters.
    pub fn with_grid(grid: Grid, mut config: SimulationConfig) -> Result<Self> {
        config.grid = grid.to_config();
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(Self {
            grid,
            config,
            rng,
            step: 0,
            history: Vec::new(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of steps applied so far
    pub fn steps_taken(&self) -> u64 {
        self.step
    }

    pub fn history(&self) -> &[StepSummary] {
        &self.history
    }

    pub fn fraction_happy(&self) -> f64 {
        self.grid.fraction_happy()
    }

    /// Unhappy residents move to random vacancies
    pub fn one_time_step(&mut self) -> RelocationOutcome {
        let outcome = relocation::random_step(&mut self.grid, &mut self.rng);
        self.record(&outcome);
        outcome
    }

    /// Greedy placement where residents end up happy, random for the rest
    pub fn one_group_step(&mut self) -> RelocationOutcome {
        let outcome = relocation::group_step(&mut self.grid, &mut self.rng);
        self.record(&outcome);
        outcome
    }

    /// Corner-sorting diagonal sweep
    pub fn efficient_time_step(&mut self) -> RelocationOutcome {
        let outcome = relocation::diagonal_sweep_step(&mut self.grid);
        self.record(&outcome);
        outcome
    }

    /// One step of the mixed policy: the diagonal sweep with odds 1 in
    /// `sweep_odds`, the group step otherwise
    pub fn step(&mut self) -> StepSummary {
        let roll = self.rng.gen_range(0..self.config.sweep_odds);
        trace!(step = self.step, roll, "Choosing relocation pass");

        let outcome = if roll == 0 {
            relocation::diagonal_sweep_step(&mut self.grid)
        } else {
            relocation::group_step(&mut self.grid, &mut self.rng)
        };
        self.record(&outcome)
    }

    /// Advance the grid `num_steps` times
    pub fn simulate(&mut self, num_steps: u64) {
        for _ in 0..num_steps {
            self.step();
        }
    }

    /// Re-randomize the population and replace the happiness threshold
    pub fn reset(
        &mut self,
        fraction_vacant: f64,
        fraction_red: f64,
        happiness_threshold: f64,
    ) -> Result<()> {
        self.grid.reset(
            fraction_vacant,
            fraction_red,
            happiness_threshold,
            &mut self.rng,
        )?;
        self.config.grid.fraction_vacant = fraction_vacant;
        self.config.grid.fraction_red = fraction_red;
        self.config.grid.happiness_threshold = happiness_threshold;

        info!(
            fraction_vacant,
            fraction_red, happiness_threshold, "Grid population reset"
        );
        Ok(())
    }

    /// Run the configured number of steps, stopping early once settled if
    /// `stop_when_settled` is set
    #[instrument(skip(self), fields(seed = self.config.seed, num_steps = self.config.num_steps))]
    pub fn run(&mut self) -> SimulationResult {
        let initial = self.grid.stats();
        let first_step = self.step;
        info!(
            size = initial.size,
            type_a = initial.type_a,
            type_b = initial.type_b,
            vacant = initial.vacant,
            fraction_happy = initial.fraction_happy,
            "Starting simulation"
        );

        let mut settled = initial.is_settled();
        for _ in 0..self.config.num_steps {
            if settled && self.config.stop_when_settled {
                break;
            }
            let summary = self.step();
            settled = summary.fraction_happy >= 1.0;
        }

        let final_stats = self.grid.stats();
        let steps_run = self.step - first_step;
        info!(
            steps_run,
            settled = final_stats.is_settled(),
            fraction_happy = final_stats.fraction_happy,
            "Simulation finished"
        );

        SimulationResult {
            seed: self.config.seed,
            steps_run,
            settled: final_stats.is_settled(),
            initial,
            final_stats,
            history: self.history[self.history.len() - steps_run as usize..].to_vec(),
        }
    }

    fn record(&mut self, outcome: &RelocationOutcome) -> StepSummary {
        let summary = StepSummary {
            step: self.step,
            kind: outcome.kind,
            moves: outcome.moves.len(),
            fraction_happy: self.grid.fraction_happy(),
        };
        debug!(
            step = summary.step,
            kind = %summary.kind,
            moves = summary.moves,
            unplaced = outcome.unplaced,
            unfilled = outcome.unfilled,
            fraction_happy = summary.fraction_happy,
            "Step applied"
        );
        self.history.push(summary.clone());
        self.step += 1;
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub seed: u64,
    pub steps_run: u64,
    pub settled: bool,
    pub initial: GridStats,
    pub final_stats: GridStats,
    pub history: Vec<StepSummary>,
}

impl SimulationResult {
    /// Steps of each kind in the history
    pub fn count_kind(&self, kind: StepKind) -> usize {
        self.history.iter().filter(|s| s.kind == kind).count()
    }
}
