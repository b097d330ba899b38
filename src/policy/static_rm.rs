//! ## Static RM voltage scaling - Pillai & Shin 2001
//!
//! #### Model:
//! - Periodic task model, constrained deadlines
//! - Fully-preemptive rate-monotonic scheduling
//!
//! #### Strategy:
//! - Chosen once at t = 0: the lowest frequency level at which the
//!   Liu & Layland utilization bound still holds for the scaled task set,
//!   i.e. Σ wcet_i / (γ · period_i) ≤ n·(2^(1/n) − 1). Falls back to the
//!   maximum speed when no level passes.
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

const GOVERNOR: &str = "Static RM (Liu & Layland bound)";

/// Static RM speed selection, Pillai & Shin 2001 \[1\]
///
/// Refer to the [module](`self`) level documentation.
pub struct Governor;

impl SpeedGovernor for Governor {
    fn governor_name(&self) -> &str { GOVERNOR }

    fn boot_speed(&mut self, taskset: &[Task]) -> Bandwidth {
        (0..NUM_FREQ_LEVELS).rev()
            .map(|level| FREQ_LEVELS[level])
            .find(|&gamma| passes_utilization_bound(taskset, gamma))
            .unwrap_or(1.0)
    }
}

// Theorem 5 [2], with execution times stretched by the inverse speed.
fn passes_utilization_bound(taskset: &[Task], gamma: f64) -> bool {
    let scaled_utilization: Bandwidth = taskset.iter()
        .map(|task| task.get_utilization() / gamma)
        .sum();

    let num_tasks = taskset.len() as f64;
    let bound = num_tasks * (2f64.powf(1.0 / num_tasks) - 1.0);

    scaled_utilization <= bound
}

// =============================================================================

#[test]
fn picks_the_lowest_passing_level() {
    // Total utilization 0.4; the bound for two tasks is ~0.828, so the
    // scaled set passes from level 0.5 upwards but not at 0.4.
    let taskset = [
        Task::new_ms(0, 0, 10, 10, 2),
        Task::new_ms(1, 0, 20, 20, 4),
    ];

    let alpha = Governor.boot_speed(&taskset);

    assert_eq!(alpha, 0.5);
}

#[test]
fn falls_back_to_full_speed_when_no_level_passes() {
    // Utilizations 0.6 and 0.3: even unscaled, 0.9 exceeds the two-task
    // bound of ~0.828.
    let taskset = [
        Task::new_ms(0, 0, 10, 10, 6),
        Task::new_ms(1, 0, 20, 20, 6),
    ];

    let alpha = Governor.boot_speed(&taskset);

    assert_eq!(alpha, 1.0);
    assert!(alpha >= 0.9);
}
