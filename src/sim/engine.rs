//! Event-driven simulation of one hyperperiod.
//!
//! The loop steps from event to event: job releases are enumerated exactly
//! from per-task release counters, the governor recomputes the speed at
//! every release and completion, the priority discipline picks the running
//! job, and time advances to the nearest of the next release, the projected
//! completion and the hyperperiod. Energy integrates over each step.

use crate::prelude::*;

pub mod prelude {
    pub use super::Simulation;
}

/// One simulation run: a task set, a policy, and the mutable state of the
/// event loop. Construct a fresh value per pass; the task list is consumed
/// so no cursor or queue state leaks between runs.
pub struct Simulation {
    tasks: Vec<Task>,
    policy: Policy,
    governor: Box<dyn SpeedGovernor>,
    hyperperiod: Time,
    pool: JobPool,
    queue: ReadyQueue,
    released: Vec<u64>,
    now: f64,
    required: Bandwidth,
    freq_index: usize,
    alpha: f64,
    last_run: Option<JobId>,
    stats: RunResult,
}

impl Simulation {
    pub fn new(tasks: Vec<Task>, policy: Policy) -> Result<Self, SimError> {
        if tasks.is_empty() {
            return Err(SimError::EmptyTaskset);
        }
        if tasks.len() > MAX_TASKS {
            return Err(SimError::TooManyTasks(tasks.len()));
        }
        if policy.family() == PriorityFamily::RateMonotonic
            && !TaskUtils::is_taskset_sorted_by_period(&tasks)
        {
            return Err(SimError::NotRateMonotonicOrder);
        }

        let hyperperiod = TaskUtils::hyperperiod(&tasks);
        let total_jobs: u64 = tasks.iter()
            .map(|task| TaskUtils::releases_in_hyperperiod(task, hyperperiod))
            .sum();
        if total_jobs > (MAX_TASKS * MAX_JOBS_PER_TASK) as u64 {
            return Err(SimError::JobPoolOverflow { needed: total_jobs });
        }

        let governor = policy.governor();
        tracing::debug!(
            policy = %policy,
            governor = governor.governor_name(),
            hyperperiod_ms = hyperperiod.as_millis(),
            jobs = total_jobs,
            "simulation constructed"
        );

        let num_tasks = tasks.len();
        Ok(Self {
            tasks,
            policy,
            governor,
            hyperperiod,
            pool: JobPool::with_capacity(total_jobs as usize),
            queue: ReadyQueue::new(),
            released: vec![0; num_tasks],
            now: 0.0,
            required: 1.0,
            freq_index: 0,
            alpha: 1.0,
            last_run: None,
            stats: RunResult::default(),
        })
    }

    pub fn hyperperiod(&self) -> Time {
        self.hyperperiod
    }

    /// Simulate one hyperperiod, publishing every event to the sink.
    pub fn run(&mut self, trace: &mut dyn TraceSink) -> RunResult {
        self.required = self.governor.boot_speed(&self.tasks);
        self.freq_index = PowerModel::freq_index_for(self.required);
        self.alpha = FREQ_LEVELS[self.freq_index];
        trace.run_started(&self.policy, self.required, self.alpha);

        let horizon = self.hyperperiod.as_f64_ms();
        while self.now < horizon {
            self.release_jobs(trace);
            self.update_speed(trace);
            self.dispatch(trace);

            if !self.advance(trace, horizon) {
                break;
            }

            self.complete_running_job(trace);
        }

        self.stats.jobs = self.pool.len();
        trace.run_finished(&self.policy, self.hyperperiod, &self.stats);

        self.stats.clone()
    }

    /// Release every task whose next periodic instant coincides with the
    /// current time. A release is a decision point.
    fn release_jobs(&mut self, trace: &mut dyn TraceSink) {
        for position in 0..self.tasks.len() {
            let task = &self.tasks[position];
            let instant = task.phase + task.period * self.released[position];
            if (instant.as_f64_ms() - self.now).abs() >= TIME_EPS {
                continue;
            }

            let task = &mut self.tasks[position];
            let actual = task.next_invocation();
            let deadline = instant + task.deadline;
            let job = self.pool.allocate(position, instant, deadline, actual);

            self.released[position] += 1;
            self.queue.push(job);
            self.stats.decision_points += 1;

            let task = &self.tasks[position];
            self.governor.note_release(task);
            trace.job_released(self.now, self.pool.get(job), task);
        }
    }

    /// Dynamic governors recompute the required speed from the queue as it
    /// stands after the releases of this instant.
    fn update_speed(&mut self, trace: &mut dyn TraceSink) {
        if !self.governor.is_dynamic() {
            return;
        }

        let view = QueueView::new(&self.tasks, &self.pool, &self.queue, self.now);
        self.required = self.governor.required_speed(&view);

        let freq_index = PowerModel::freq_index_for(self.required);
        let alpha = FREQ_LEVELS[freq_index];
        if (alpha - self.alpha).abs() > TIME_EPS {
            trace.speed_changed(self.now, self.alpha, alpha, self.required);
        }

        self.freq_index = freq_index;
        self.alpha = alpha;
    }

    /// Pick the running job under the priority discipline. A change of the
    /// running job is a context switch; displacing another running job is a
    /// preemption.
    fn dispatch(&mut self, trace: &mut dyn TraceSink) {
        let current = self.pick_job();

        if current != self.last_run {
            self.stats.context_switches += 1;
            if current.is_some() && self.last_run.is_some() {
                self.stats.preemptions += 1;
            }
            if let Some(id) = current {
                let job = self.pool.get(id);
                trace.job_scheduled(self.now, job, &self.tasks[job.task]);
            }
        }

        self.last_run = current;
    }

    /// Highest-priority job of the ready queue; the first of equal keys in
    /// insertion order wins.
    fn pick_job(&self) -> Option<JobId> {
        let key = |id: JobId| -> u64 {
            let job = self.pool.get(id);
            match self.policy.family() {
                PriorityFamily::EarliestDeadline => job.absolute_deadline.as_millis(),
                PriorityFamily::RateMonotonic => self.tasks[job.task].period.as_millis(),
            }
        };

        self.queue.iter().fold(None, |best, id| match best {
            None => Some(id),
            Some(current) if key(id) < key(current) => Some(id),
            _ => best,
        })
    }

    /// Advance to the nearest of the next release, the running job's
    /// projected completion and the hyperperiod, integrating energy over
    /// the elapsed interval. Returns false when the run is over.
    fn advance(&mut self, trace: &mut dyn TraceSink, horizon: f64) -> bool {
        let next_release = self.tasks.iter()
            .zip(&self.released)
            .map(|(task, &count)| (task.phase + task.period * count).as_f64_ms())
            .map(ordered_float::OrderedFloat)
            .min()
            .map(|t| t.0);

        let completion = self.last_run
            .filter(|_| self.alpha > TIME_EPS)
            .map(|id| self.now + self.pool.get(id).remaining_work / self.alpha);

        let next_event = [Some(horizon), next_release, completion].into_iter()
            .flatten()
            .map(ordered_float::OrderedFloat)
            .min()
            .map(|t| t.0)
            .unwrap_or(horizon);

        let duration = next_event - self.now;
        if duration < TIME_EPS {
            // Degenerate step: nudge the clock to avoid spinning in place.
            if self.now >= horizon {
                return false;
            }
            self.now += TIME_EPS;
            return self.now < horizon;
        }

        match self.last_run {
            Some(id) => {
                self.stats.total_energy += PowerModel::energy(duration, self.freq_index);
                self.pool.get_mut(id).remaining_work -= duration * self.alpha;
            },
            None => {
                trace.processor_idle(self.now, duration);
                self.stats.total_energy +=
                    PowerModel::energy(duration, PowerModel::lowest_freq_index());
            },
        }

        self.now = next_event;

        true
    }

    /// Retire the running job once its remaining work is exhausted. A
    /// completion is a decision point; the next dispatch after it counts as
    /// a context switch, not a preemption.
    fn complete_running_job(&mut self, trace: &mut dyn TraceSink) {
        let Some(id) = self.last_run else { return };
        if self.pool.get(id).remaining_work > TIME_EPS {
            return;
        }

        self.stats.decision_points += 1;

        let job = self.pool.get(id);
        let task = &self.tasks[job.task];
        trace.job_completed(self.now, job, task);

        if self.now > job.absolute_deadline.as_f64_ms() + TIME_EPS {
            self.stats.deadline_misses += 1;
            trace.deadline_missed(self.now, job, task);
        }

        self.governor.note_completion(task, job);
        self.queue.remove(id);
        self.last_run = None;
    }
}

// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with_trace(
        id: usize,
        phase: u64,
        period: u64,
        deadline: u64,
        wcet: u64,
        invocations: &[u64]
    ) -> Task {
        let mut task = Task::new_ms(id, phase, period, deadline, wcet);
        task.set_invocations(invocations.iter().map(|&ms| Time::millis(ms)).collect());
        task
    }

    fn run(tasks: Vec<Task>, policy: Policy) -> RunResult {
        let mut sim = Simulation::new(tasks, policy).unwrap();
        sim.run(&mut NullTrace)
    }

    #[test]
    fn rejects_unsorted_tasks_for_rate_monotonic() {
        let tasks = vec![
            Task::new_ms(0, 0, 6, 6, 2),
            Task::new_ms(1, 0, 4, 4, 1),
        ];

        assert!(matches!(
            Simulation::new(tasks.clone(), Policy::plain_rm()),
            Err(SimError::NotRateMonotonicOrder)
        ));
        assert!(Simulation::new(tasks, Policy::plain_edf()).is_ok());
    }

    #[test]
    fn single_task_at_full_speed() {
        // 5 ms of work in a 10 ms hyperperiod: busy at the maximum level,
        // idle at the lowest.
        let tasks = vec![task_with_trace(0, 0, 10, 10, 5, &[5])];
        let result = run(tasks, Policy::plain_edf());

        assert_eq!(result.jobs, 1);
        assert_eq!(result.deadline_misses, 0);

        let expected = 1.0 * 5.0 * 5.0 * 5.0 + 0.4 * 3.2 * 3.2 * 5.0;
        assert!((result.total_energy - expected).abs() < 1e-9);
    }

    #[test]
    fn static_edf_stretches_the_job_over_the_period() {
        // Utilization 0.5 discretises to the 0.5 level: the job runs the
        // full 10 ms and completes exactly at its deadline, without a miss.
        let tasks = vec![task_with_trace(0, 0, 10, 10, 5, &[5])];
        let result = run(tasks, Policy::static_edf());

        assert_eq!(result.deadline_misses, 0);

        let expected = 0.5 * 3.5 * 3.5 * 10.0;
        assert!((result.total_energy - expected).abs() < 1e-9);
    }

    #[test]
    fn two_task_set_completes_every_job() {
        let tasks = vec![
            Task::new_ms(0, 0, 4, 4, 1),
            Task::new_ms(1, 0, 6, 6, 2),
        ];

        for policy in [Policy::plain_edf(), Policy::static_edf(), Policy::cc_edf(), Policy::la_edf()] {
            let result = run(tasks.clone(), policy);

            assert_eq!(result.jobs, 5, "{policy}");
            assert_eq!(result.deadline_misses, 0, "{policy}");
        }
    }

    #[test]
    fn idle_intervals_charge_the_lowest_level() {
        // Utilization 0.2: 2 ms busy at full speed, 8 ms idle at 0.4/3.2V.
        let tasks = vec![task_with_trace(0, 0, 10, 10, 2, &[2])];
        let result = run(tasks, Policy::plain_edf());

        let expected = 1.0 * 5.0 * 5.0 * 2.0 + 0.4 * 3.2 * 3.2 * 8.0;
        assert!((result.total_energy - expected).abs() < 1e-9);
    }

    #[test]
    fn overrun_past_the_deadline_counts_one_miss() {
        // Actual execution twice the wcet: completion at 6 ms against a
        // 5 ms deadline.
        let tasks = vec![task_with_trace(0, 0, 10, 5, 3, &[6])];
        let result = run(tasks, Policy::plain_edf());

        assert_eq!(result.jobs, 1);
        assert_eq!(result.deadline_misses, 1);
    }

    #[test]
    fn earlier_deadline_preempts_the_running_job() {
        // The 1 ms job released at t=2 with deadline 5 displaces the long
        // job (deadline 6), which then resumes.
        let tasks = vec![
            Task::new_ms(0, 0, 6, 6, 3),
            Task::new_ms(1, 2, 6, 3, 1),
        ];
        let result = run(tasks, Policy::plain_edf());

        assert_eq!(result.preemptions, 1);
        assert_eq!(result.context_switches, 3);
        assert_eq!(result.deadline_misses, 0);
    }

    #[test]
    fn cc_edf_reclaims_slack_while_other_work_is_pending() {
        // Task 0 finishes early; the reclaimed slack slows the rest of
        // task 1's job down, which static scaling cannot do.
        let tasks = vec![
            task_with_trace(0, 0, 10, 10, 5, &[2]),
            task_with_trace(1, 0, 10, 10, 4, &[4]),
        ];

        let cc = run(tasks.clone(), Policy::cc_edf());
        let fixed = run(tasks, Policy::static_edf());

        assert_eq!(cc.deadline_misses, 0);
        assert!(cc.total_energy < fixed.total_energy);
    }

    #[test]
    fn cc_edf_slows_down_at_completion() {
        let tasks = vec![task_with_trace(0, 0, 10, 10, 5, &[2])];

        let mut sim = Simulation::new(tasks, Policy::cc_edf()).unwrap();
        let mut speed = SpeedTrace::new();
        sim.run(&mut speed);

        // Boot at 1.0, 0.5 at the release, 0.4 once the slack is reclaimed.
        assert_eq!(speed.samples(), &[(0.0, 1.0), (0.0, 0.5), (4.0, 0.4)]);
    }

    #[test]
    fn cc_rm_meets_deadlines_on_a_light_set() {
        let tasks = vec![
            Task::new_ms(0, 0, 10, 10, 2),
            Task::new_ms(1, 0, 20, 20, 4),
        ];

        let reclaimed = run(tasks.clone(), Policy::cc_rm());
        let plain = run(tasks, Policy::plain_rm());

        assert_eq!(reclaimed.deadline_misses, 0);
        assert!(reclaimed.total_energy < plain.total_energy);
    }

    #[test]
    fn runs_are_deterministic() {
        let tasks = vec![
            Task::new_ms(0, 0, 4, 4, 1),
            Task::new_ms(1, 0, 6, 6, 2),
        ];

        let first = run(tasks.clone(), Policy::la_edf());
        let second = run(tasks, Policy::la_edf());

        assert_eq!(first, second);
    }

    #[test]
    fn phased_task_releases_after_its_offset() {
        let tasks = vec![
            Task::new_ms(0, 0, 4, 4, 1),
            Task::new_ms(1, 3, 6, 6, 1),
        ];
        let result = run(tasks, Policy::plain_edf());

        // Task 0 releases at 0, 4, 8; task 1 at 3 and 9.
        assert_eq!(result.jobs, 5);
        assert_eq!(result.deadline_misses, 0);
    }

    #[test]
    fn rate_monotonic_prefers_the_shorter_period() {
        // The 4 ms-period task released at t=4 preempts the long-period job
        // mid-execution; the set stays within the two-task bound.
        let tasks = vec![
            Task::new_ms(0, 0, 4, 4, 1),
            Task::new_ms(1, 0, 8, 8, 4),
        ];
        let result = run(tasks, Policy::plain_rm());

        assert_eq!(result.preemptions, 1);
        assert_eq!(result.deadline_misses, 0);
    }
}
