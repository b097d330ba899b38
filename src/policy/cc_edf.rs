//! ## Cycle-conserving EDF - Pillai & Shin 2001
//!
//! #### Model:
//! - Periodic task model, implicit or constrained deadlines
//! - Fully-preemptive EDF scheduling
//!
//! #### Strategy:
//! - Recomputed at every release and completion from a per-task utilization
//!   ledger. A release charges the task its worst case (wcet/period); its
//!   completion lowers the entry to the cycles actually used
//!   (actual/period), reclaiming the slack until the next release. The
//!   required speed is the ledger sum.
//!
//! ---
//! #### References:
//! 1. P. Pillai and K. G. Shin, “Real-time dynamic voltage scaling for
//!    low-power embedded operating systems,” in Proc. SOSP ’01, 2001,
//!    pp. 89–102, doi: 10.1145/502034.502044.

use crate::prelude::*;

const GOVERNOR: &str = "Cycle-conserving EDF";

/// Cycle-conserving EDF speed selection, Pillai & Shin 2001 \[1\]
///
/// Refer to the [module](`self`) level documentation. Tasks that have not
/// released yet contribute nothing to the ledger.
pub struct Governor {
    utilizations: Vec<Bandwidth>,
}

impl Governor {
    pub fn new() -> Self {
        Self { utilizations: Vec::new() }
    }
}

impl Default for Governor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedGovernor for Governor {
    fn governor_name(&self) -> &str { GOVERNOR }

    fn boot_speed(&mut self, taskset: &[Task]) -> Bandwidth {
        let slots = taskset.iter()
            .map(|task| task.id + 1)
            .max()
            .unwrap_or(0);
        self.utilizations = vec![0.0; slots];

        1.0
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn note_release(&mut self, task: &Task) {
        self.utilizations[task.id] = task.get_utilization();
    }

    fn note_completion(&mut self, task: &Task, job: &Job) {
        self.utilizations[task.id] = job.actual.as_f64_ms() / task.period.as_f64_ms();
    }

    fn required_speed(&mut self, _view: &QueueView) -> Bandwidth {
        self.utilizations.iter().sum()
    }
}

// =============================================================================
