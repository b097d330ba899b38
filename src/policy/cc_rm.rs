//! ## Cycle-conserving RM - Pillai & Shin 2001
//!
//! #### Model:
//! - Periodic task model, constrained deadlines
//! - Fully-preemptive rate-monotonic scheduling
//!
//! #### Preconditions:
//! - Task set sorted by ascending period (enforced by the engine for the
//!   rate-monotonic family)
//!
//! #### Strategy:
//! - Recomputed at every release and completion: the lowest frequency level
//!   γ at which a response-time analysis of the scaled set succeeds. For
//!   each task the iteration starts from its wcet and folds in the
//!   interference of every shorter-period task; the task's own demand is
//!   the remaining work of its outstanding job, or the full wcet when none
//!   is pending. Falls back to the maximum speed when no level passes.
//!
//! ---
//! #### References:
//! 1. P. Pillai and K. G. Shin, “Real-time dynamic voltage scaling for
//!    low-power embedded operating systems,” in Proc. SOSP ’01, 2001,
//!    pp. 89–102, doi: 10.1145/502034.502044.
//! 2. M. Joseph and P. Pandya, “Finding Response Times in a Real-Time
//!    System,” Comput J, vol. 29, no. 5, pp. 390–395, 1986,
//!    doi: 10.1093/comjnl/29.5.390.

use crate::prelude::*;

const GOVERNOR: &str = "Cycle-conserving RM";

/// Convergence tolerance of the response-time iteration.
const RESPONSE_EPS: f64 = 1e-6;

/// Cycle-conserving RM speed selection, Pillai & Shin 2001 \[1\]
///
/// Refer to the [module](`self`) level documentation.
pub struct Governor;

impl SpeedGovernor for Governor {
    fn governor_name(&self) -> &str { GOVERNOR }

    fn boot_speed(&mut self, _taskset: &[Task]) -> Bandwidth {
        1.0
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn required_speed(&mut self, view: &QueueView) -> Bandwidth {
        (0..NUM_FREQ_LEVELS).rev()
            .map(|level| FREQ_LEVELS[level])
            .find(|&gamma| is_feasible_at(view, gamma))
            .unwrap_or(1.0)
    }
}

/// Response-time analysis of the whole set at speed `gamma` \[2\].
fn is_feasible_at(view: &QueueView, gamma: f64) -> bool {
    view.tasks.iter().enumerate()
        .all(|(i, task)| task_converges_at(view, i, task, gamma))
}

fn task_converges_at(view: &QueueView, position: usize, task: &Task, gamma: f64) -> bool {
    let my_work = view.remaining_work_of_task(position)
        .unwrap_or(task.wcet.as_f64_ms());
    let deadline = task.deadline.as_f64_ms();

    let mut response = task.wcet.as_f64_ms();
    loop {
        let interference: f64 = view.tasks[..position].iter()
            .map(|hp| (response / hp.period.as_f64_ms()).ceil() * hp.wcet.as_f64_ms())
            .sum();

        let new_response = (my_work + interference) / gamma;
        if new_response > deadline {
            return false;
        }
        if (new_response - response).abs() < RESPONSE_EPS {
            return true;
        }

        response = new_response;
    }
}

// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn view_of<'a>(
        tasks: &'a [Task],
        pool: &'a JobPool,
        queue: &'a ReadyQueue
    ) -> QueueView<'a> {
        QueueView::new(tasks, pool, queue, 0.0)
    }

    #[test]
    fn single_light_task_runs_at_the_lowest_level() {
        // Response time 2/γ stays within the 10 ms deadline even at 0.4.
        let taskset = [Task::new_ms(0, 0, 10, 10, 2)];
        let pool = JobPool::with_capacity(1);
        let queue = ReadyQueue::new();

        let alpha = Governor.required_speed(&view_of(&taskset, &pool, &queue));

        assert_eq!(alpha, 0.4);
    }

    #[test]
    fn interference_forces_a_higher_level() {
        // With an empty queue both tasks are charged their wcet. The second
        // task converges within its 6 ms deadline only from level 0.7 up.
        let taskset = [
            Task::new_ms(0, 0, 4, 4, 1),
            Task::new_ms(1, 0, 6, 6, 2),
        ];
        let pool = JobPool::with_capacity(2);
        let queue = ReadyQueue::new();

        let alpha = Governor.required_speed(&view_of(&taskset, &pool, &queue));

        assert_eq!(alpha, 0.7);
    }

    #[test]
    fn outstanding_work_replaces_the_worst_case() {
        // A nearly finished job of task 1 lowers its demand, and a lower
        // level becomes feasible.
        let taskset = [
            Task::new_ms(0, 0, 4, 4, 1),
            Task::new_ms(1, 0, 6, 6, 2),
        ];
        let mut pool = JobPool::with_capacity(2);
        let mut queue = ReadyQueue::new();

        let job = pool.allocate(1, Time::zero(), Time::millis(6), Time::millis(2));
        pool.get_mut(job).remaining_work = 0.4;
        queue.push(job);

        let alpha = Governor.required_speed(&view_of(&taskset, &pool, &queue));

        assert!(alpha < 0.7);
    }

    #[test]
    fn full_speed_when_no_level_converges() {
        let taskset = [
            Task::new_ms(0, 0, 10, 10, 6),
            Task::new_ms(1, 0, 12, 12, 6),
        ];
        let pool = JobPool::with_capacity(2);
        let queue = ReadyQueue::new();

        let alpha = Governor.required_speed(&view_of(&taskset, &pool, &queue));

        assert_eq!(alpha, 1.0);
    }
}
