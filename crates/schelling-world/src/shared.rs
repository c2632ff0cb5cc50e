//! Lock-guarded handle for driving one simulation from several threads.

use crate::simulation::Simulation;
use parking_lot::Mutex;
use schelling_core::{GridStats, StepSummary};
use std::sync::Arc;

/// Cloneable handle; every operation holds the lock for its whole duration
#[derive(Clone)]
pub struct SharedSimulation {
    inner: Arc<Mutex<Simulation>>,
}

impl SharedSimulation {
    pub fn new(simulation: Simulation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(simulation)),
        }
    }

    pub fn step(&self) -> StepSummary {
        self.inner.lock().step()
    }

    pub fn stats(&self) -> GridStats {
        self.inner.lock().grid().stats()
    }

    /// Run `f` with exclusive access to the simulation
    pub fn with<T>(&self, f: impl FnOnce(&mut Simulation) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
