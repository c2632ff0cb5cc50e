//! Grid engine for the residential segregation simulation.
//!
//! This crate owns the square grid of residents, the happiness rule, and the
//! relocation passes that advance it over discrete steps.

pub mod grid;
pub mod population;
pub mod relocation;
pub mod simulation;
pub mod experiment;
pub mod shared;

pub use grid::{Grid, NeighborCounts};
pub use population::PopulationCounts;
pub use relocation::RelocationOutcome;
pub use simulation::{Simulation, SimulationResult};
pub use experiment::{Experiment, ExperimentResult};
pub use shared::SharedSimulation;
