//! Batch runner for segregation experiments.
//!
//! Reads a JSON `RunnerConfig` from the path in `SCHELLING_CONFIG` (defaults
//! otherwise), runs every replicate and prints a JSON summary on stdout.

mod telemetry;

use anyhow::{Context, Result};
use schelling_core::{ReplicateStats, RunnerConfig};
use schelling_world::{Experiment, ExperimentResult};
use serde::Serialize;
use tracing::{error, info};

#[derive(Serialize)]
struct Report {
    config: RunnerConfig,
    summary: ReplicateStats,
    runs: Vec<ExperimentResult>,
}

fn load_config() -> Result<RunnerConfig> {
    match std::env::var("SCHELLING_CONFIG") {
        Ok(path) => RunnerConfig::load(&path)
            .with_context(|| format!("failed to load runner config from {}", path)),
        Err(_) => Ok(RunnerConfig::default()),
    }
}

fn main() -> Result<()> {
    let json_logs = std::env::var("SCHELLING_LOG_JSON").is_ok_and(|v| v == "1");
    telemetry::init_telemetry(json_logs)?;

    let config = load_config()?;
    info!(
        replicates = config.replicates,
        size = config.experiment.grid.size,
        num_steps = config.experiment.num_steps,
        "Starting Erehwon runner"
    );

    let mut summary = ReplicateStats::new();
    let mut runs = Vec::with_capacity(config.replicates as usize);

    for (i, experiment) in Experiment::replicates(&config.experiment, config.replicates)
        .into_iter()
        .enumerate()
    {
        let id = experiment.id;
        match experiment.execute() {
            Ok(outcome) => {
                log_progress(&outcome, config.log_every);
                info!(
                    replicate = i,
                    experiment_id = %id,
                    seed = outcome.result.seed,
                    steps_run = outcome.result.steps_run,
                    settled = outcome.result.settled,
                    fraction_happy = outcome.result.final_stats.fraction_happy,
                    "Replicate complete"
                );
                summary.update(outcome.result.steps_run, &outcome.result.final_stats);
                runs.push(outcome);
            }
            Err(e) => {
                error!(replicate = i, experiment_id = %id, "Replicate failed: {}", e);
                return Err(e.into());
            }
        }
    }

    info!(
        runs = summary.runs,
        settled_runs = summary.settled_runs,
        avg_fraction_happy = summary.avg_fraction_happy,
        "All replicates complete"
    );

    let report = Report {
        config,
        summary,
        runs,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Log every `every`-th step of a finished run
fn log_progress(outcome: &ExperimentResult, every: u64) {
    if every == 0 {
        return;
    }
    for step in outcome.result.history.iter().filter(|s| s.step % every == 0) {
        info!(
            experiment_id = %outcome.id,
            step = step.step,
            kind = %step.kind,
            moves = step.moves,
            fraction_happy = step.fraction_happy,
            "Step {}",
            step.step
        );
    }
}
