//! ## Static EDF voltage scaling - Pillai & Shin 2001
//!
//! #### Model:
//! - Periodic task model, implicit or constrained deadlines
//! - Fully-preemptive EDF scheduling
//!
//! #### Strategy:
//! - Chosen once at t = 0: the required speed is the total worst-case
//!   utilization of the task set. EDF keeps the set schedulable at any
//!   speed at or above that bound.
//!
//! ---
//! #### References:
//! 1. P. Pillai and K. G. Shin, “Real-time dynamic voltage scaling for
//!    low-power embedded operating systems,” in Proc. SOSP ’01, 2001,
//!    pp. 89–102, doi: 10.1145/502034.502044.
//! 2. C. L. Liu and J. W. Layland, “Scheduling Algorithms for
//!    Multiprogramming in a Hard-Real-Time Environment,” J. ACM, vol. 20,
//!    no. 1, pp. 46–61, Jan. 1973, doi: 10.1145/321738.321743.

use crate::prelude::*;

const GOVERNOR: &str = "Static EDF (total utilization)";

/// Static EDF speed selection, Pillai & Shin 2001 \[1\]
///
/// Refer to the [module](`self`) level documentation.
pub struct Governor;

impl SpeedGovernor for Governor {
    fn governor_name(&self) -> &str { GOVERNOR }

    fn boot_speed(&mut self, taskset: &[Task]) -> Bandwidth {
        TaskUtils::total_utilization(taskset)
    }
}

// =============================================================================

#[test]
fn required_speed_is_the_total_utilization() {
    let taskset = [
        Task::new_ms(0, 0, 4, 4, 1),
        Task::new_ms(1, 0, 6, 6, 2),
    ];

    let alpha = Governor.boot_speed(&taskset);

    assert!((alpha - (1.0 / 4.0 + 2.0 / 6.0)).abs() < 1e-12);
    assert_eq!(PowerModel::freq_index_for(alpha), 4); // 0.583 -> 0.6
}

#[test]
fn half_utilization_discretises_to_the_exact_level() {
    let taskset = [Task::new_ms(0, 0, 10, 10, 5)];

    let alpha = Governor.boot_speed(&taskset);

    assert!((alpha - 0.5).abs() < 1e-12);
    assert_eq!(FREQ_LEVELS[PowerModel::freq_index_for(alpha)], 0.5);
}
