//! ## Fixed maximum speed
//!
//! Baseline for both priority families: the processor runs at the maximum
//! frequency for the whole hyperperiod. Energy under this governor is the
//! denominator for the normalised results of its family.

use crate::prelude::*;

const GOVERNOR: &str = "Plain (fixed maximum speed)";

pub struct Governor;

impl SpeedGovernor for Governor {
    fn governor_name(&self) -> &str { GOVERNOR }

    fn boot_speed(&mut self, _taskset: &[Task]) -> Bandwidth {
        1.0
    }
}
