//! ## Look-ahead EDF - Pillai & Shin 2001
//!
//! #### Model:
//! - Periodic task model, implicit or constrained deadlines
//! - Fully-preemptive EDF scheduling
//!
//! #### Strategy:
//! - Recomputed at every release and completion: run just fast enough to
//!   drain the aggregate remaining work of the ready queue by its nearest
//!   absolute deadline. An empty queue idles at the lowest level; a
//!   deadline at or behind the current instant demands full speed. The
//!   result is clamped to the available frequency range.
//!
//! ---
//! #### References:
//! 1. P. Pillai and K. G. Shin, “Real-time dynamic voltage scaling for
//!    low-power embedded operating systems,” in Proc. SOSP ’01, 2001,
//!    pp. 89–102, doi: 10.1145/502034.502044.

use crate::prelude::*;

const GOVERNOR: &str = "Look-ahead EDF";

/// Look-ahead EDF speed selection, after Pillai & Shin 2001 \[1\]
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
        let Some(earliest_deadline) = view.earliest_deadline() else {
            return PowerModel::lowest_frequency();
        };

        let deadline = earliest_deadline.as_f64_ms();
        if deadline <= view.now + TIME_EPS {
            return 1.0;
        }

        let work = view.total_remaining_work();
        let required = work / (deadline - view.now);

        required.clamp(PowerModel::lowest_frequency(), 1.0)
    }
}

// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with(jobs: &[(u64, f64)]) -> (JobPool, ReadyQueue) {
        let mut pool = JobPool::with_capacity(jobs.len());
        let mut queue = ReadyQueue::new();

        for (task, &(deadline, remaining)) in jobs.iter().enumerate() {
            let id = pool.allocate(
                task,
                Time::zero(),
                Time::millis(deadline),
                Time::millis(remaining.ceil() as u64),
            );
            pool.get_mut(id).remaining_work = remaining;
            queue.push(id);
        }

        (pool, queue)
    }

    #[test]
    fn empty_queue_idles_at_the_lowest_level() {
        let taskset = [Task::new_ms(0, 0, 10, 10, 5)];
        let (pool, queue) = queue_with(&[]);

        let alpha = Governor.required_speed(&QueueView::new(&taskset, &pool, &queue, 3.0));

        assert_eq!(alpha, 0.4);
    }

    #[test]
    fn speed_is_work_over_laxity() {
        let taskset = [
            Task::new_ms(0, 0, 10, 10, 5),
            Task::new_ms(1, 0, 20, 20, 5),
        ];
        let (pool, queue) = queue_with(&[(10, 3.0), (20, 3.0)]);

        let alpha = Governor.required_speed(&QueueView::new(&taskset, &pool, &queue, 2.0));

        // 6 ms of work, 8 ms to the nearest deadline.
        assert!((alpha - 0.75).abs() < 1e-12);
    }

    #[test]
    fn passed_deadline_demands_full_speed() {
        let taskset = [Task::new_ms(0, 0, 10, 10, 5)];
        let (pool, queue) = queue_with(&[(10, 1.0)]);

        let alpha = Governor.required_speed(&QueueView::new(&taskset, &pool, &queue, 10.0));

        assert_eq!(alpha, 1.0);
    }

    #[test]
    fn result_is_clamped_to_the_frequency_range() {
        let taskset = [Task::new_ms(0, 0, 100, 100, 5)];

        let (pool, queue) = queue_with(&[(100, 1.0)]);
        let relaxed = Governor.required_speed(&QueueView::new(&taskset, &pool, &queue, 0.0));
        assert_eq!(relaxed, 0.4);

        let (pool, queue) = queue_with(&[(100, 200.0)]);
        let overloaded = Governor.required_speed(&QueueView::new(&taskset, &pool, &queue, 0.0));
        assert_eq!(overloaded, 1.0);
    }
}
