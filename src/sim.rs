pub mod prelude {
    pub use super::job::prelude::*;
    pub use super::engine::prelude::*;
    pub use super::{
        RunResult,
        SimError,
    };
}

pub mod job;
pub mod engine;

use crate::prelude::*;

/// Aggregate outcome of one simulated hyperperiod.
#[derive(Clone)]
#[derive(Debug, Default)]
#[derive(PartialEq)]
#[derive(serde::Serialize)]
pub struct RunResult {
    pub total_energy: f64,
    pub jobs: usize,
    pub decision_points: usize,
    pub preemptions: usize,
    pub context_switches: usize,
    pub deadline_misses: usize,
}

#[derive(Debug)]
pub enum SimError {
    EmptyTaskset,
    TooManyTasks(usize),
    NotRateMonotonicOrder,
    JobPoolOverflow { needed: u64 },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Simulation error, ")?;
        match self {
            SimError::EmptyTaskset =>
                write!(f, "the task set is empty")?,
            SimError::TooManyTasks(count) =>
                write!(f, "task count {count} exceeds the bound of {MAX_TASKS}")?,
            SimError::NotRateMonotonicOrder =>
                write!(f, "rate-monotonic policies require the task set sorted by period")?,
            SimError::JobPoolOverflow { needed } =>
                write!(f, "the hyperperiod releases {needed} jobs, above the pool bound")?,
        };

        Ok(())
    }
}

impl std::error::Error for SimError {}
