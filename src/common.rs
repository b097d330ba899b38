pub mod prelude {
    pub use super::taskset_io::prelude::*;
    pub use super::{
        Time,
        Task,
        TaskUtils,
        Bandwidth,
        MAX_TASKS,
        MAX_JOBS_PER_TASK,
        TIME_EPS,
    };
}

pub mod taskset_io;

/// Upper bound on the number of tasks in a task set.
pub const MAX_TASKS: usize = 10;

/// Upper bound on the recorded/synthesised invocations of a single task.
pub const MAX_JOBS_PER_TASK: usize = 500;

/// Tolerance for comparisons of simulated time.
pub const TIME_EPS: f64 = 1e-9;

#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq, PartialOrd, Ord)]
pub struct Time {
    pub value_ms: u64
}

/// Fraction of the processor, for utilizations and required speeds.
pub type Bandwidth = f64;

/// A periodic task. Static parameters are fixed for the duration of a run;
/// the invocation cursor rotates as jobs are released.
#[derive(Clone)]
#[derive(Debug)]
pub struct Task {
    pub id: usize,
    pub phase: Time,
    pub period: Time,
    pub deadline: Time,
    pub wcet: Time,
    invocations: Vec<Time>,
    cursor: usize,
}

pub struct TaskUtils;

// =============================================================================

impl Time {
    const SECS_TO_MILLI: u64 = 1000;

    pub fn zero() -> Self {
        Self { value_ms: 0 }
    }

    pub fn millis(time_ms: u64) -> Self {
        Self { value_ms: time_ms }
    }

    pub fn secs(time_s: u64) -> Self {
        Self { value_ms: time_s * Self::SECS_TO_MILLI }
    }

    pub fn as_millis(&self) -> u64 {
        self.value_ms
    }

    pub fn as_f64_ms(&self) -> f64 {
        self.value_ms as f64
    }
}

impl std::ops::Add for Time {
    type Output = Time;

    fn add(self, rhs: Self) -> Self::Output {
        Self::Output { value_ms: (self.value_ms + rhs.value_ms) }
    }
}

impl std::ops::Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output { value_ms: (self.value_ms - rhs.value_ms) }
    }
}

impl std::ops::Mul<u64> for Time {
    type Output = Time;

    fn mul(self, rhs: u64) -> Self::Output {
        Self::Output { value_ms: (self.value_ms * rhs) }
    }
}

impl std::ops::Mul<Time> for u64 {
    type Output = Time;

    fn mul(self, rhs: Time) -> Self::Output {
        rhs * self
    }
}

impl std::ops::Div for Time {
    type Output = u64;

    fn div(self, rhs: Self) -> Self::Output {
        self.value_ms / rhs.value_ms
    }
}

impl std::iter::Sum for Time {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Time::zero(), |acc, val| acc + val)
    }
}

impl serde::Serialize for Time {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer {
        format!("{} ms", self.value_ms).serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Time {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de> {
        let time_string = String::deserialize(deserializer)?;

        let pieces: Vec<_> = time_string.trim().split_whitespace().collect();
        if pieces.len() == 1 {
            let time: u64 = pieces[0].parse()
                .map_err(|err| serde::de::Error::custom(format!("Invalid time: {err}")))?;

            Ok(Time { value_ms: time })
        } else if pieces.len() == 2 {
            let time: u64 = pieces[0].parse()
                .map_err(|err| serde::de::Error::custom(format!("Invalid time: {err}")))?;
            let unit = match pieces[1] {
                "s" => Time::SECS_TO_MILLI,
                "ms" => 1,
                u => { return Err(serde::de::Error::custom(format!("Unknown time unit: {u}"))); }
            };

            Ok(Time { value_ms: time * unit })
        } else {
            return Err(serde::de::Error::custom("Parsing error, unknown format"));
        }
    }
}

impl Task {
    pub fn new_ms(id: usize, phase: u64, period: u64, deadline: u64, wcet: u64) -> Self {
        Self {
            id,
            phase: Time::millis(phase),
            period: Time::millis(period),
            deadline: Time::millis(deadline),
            wcet: Time::millis(wcet),
            invocations: Vec::new(),
            cursor: 0,
        }
    }

    pub fn get_utilization(&self) -> Bandwidth {
        (self.wcet.value_ms as Bandwidth) / (self.period.value_ms as Bandwidth)
    }

    pub fn has_implicit_deadline(&self) -> bool {
        self.deadline == self.period
    }

    pub fn has_constrained_deadline(&self) -> bool {
        self.deadline <= self.period
    }

    pub fn set_invocations(&mut self, invocations: Vec<Time>) {
        self.invocations = invocations;
        self.cursor = 0;
    }

    pub fn invocations(&self) -> &[Time] {
        &self.invocations
    }

    /// Actual execution time of the next job of this task. The cursor wraps,
    /// so a finite trace covers any number of releases; an empty trace yields
    /// the task's worst case.
    pub fn next_invocation(&mut self) -> Time {
        if self.invocations.is_empty() {
            return self.wcet;
        }

        let actual = self.invocations[self.cursor];
        self.cursor = (self.cursor + 1) % self.invocations.len();
        actual
    }
}

impl TaskUtils {
    pub fn is_taskset_sorted_by_period(taskset: &[Task]) -> bool {
        taskset.windows(2).all(|w| w[0].period <= w[1].period)
    }

    pub fn constrained_deadlines(taskset: &[Task]) -> bool {
        taskset.iter().all(Task::has_constrained_deadline)
    }

    pub fn total_utilization(taskset: &[Task]) -> Bandwidth {
        taskset.iter()
            .map(Task::get_utilization)
            .sum()
    }

    pub fn largest_utilization(taskset: &[Task]) -> Bandwidth {
        let max = taskset.iter()
            .map(|t| ordered_float::OrderedFloat(Task::get_utilization(t)))
            .max();

        match max {
            Some(max) => *max,
            None => 0f64,
        }
    }

    pub fn hyperperiod(taskset: &[Task]) -> Time {
        let hyperperiod_ms =
            taskset.iter()
            .map(|task| task.period.value_ms)
            .fold(1, |lcm, period| num::integer::lcm(lcm, period));

        Time { value_ms: hyperperiod_ms }
    }

    /// Number of jobs the given task releases within the hyperperiod.
    pub fn releases_in_hyperperiod(task: &Task, hyperperiod: Time) -> u64 {
        if task.phase >= hyperperiod {
            return 0;
        }

        (hyperperiod - task.phase - Time::millis(1)) / task.period + 1
    }

    /// Clone of the task set in ascending period order. The sort is stable,
    /// so equal periods keep their original relative order.
    pub fn rate_monotonic_order(taskset: &[Task]) -> Vec<Task> {
        let mut sorted = taskset.to_vec();
        sorted.sort_by_key(|task| task.period);
        sorted
    }
}

// =============================================================================

#[test]
fn hyperperiod_is_period_lcm() {
    let taskset = [
        Task::new_ms(0, 0, 4, 4, 1),
        Task::new_ms(1, 0, 6, 6, 2),
    ];

    assert_eq!(TaskUtils::hyperperiod(&taskset), Time::millis(12));
}

#[test]
fn invocation_cursor_wraps() {
    let mut task = Task::new_ms(0, 0, 10, 10, 5);
    task.set_invocations(vec![Time::millis(2), Time::millis(1)]);

    assert_eq!(task.next_invocation(), Time::millis(2));
    assert_eq!(task.next_invocation(), Time::millis(1));
    assert_eq!(task.next_invocation(), Time::millis(2));
}

#[test]
fn empty_trace_falls_back_to_wcet() {
    let mut task = Task::new_ms(0, 0, 10, 10, 5);

    assert_eq!(task.next_invocation(), Time::millis(5));
    assert_eq!(task.next_invocation(), Time::millis(5));
}

#[test]
fn releases_count_accounts_for_phase() {
    let hyperperiod = Time::millis(12);

    let in_phase = Task::new_ms(0, 0, 4, 4, 1);
    let offset = Task::new_ms(1, 2, 4, 4, 1);

    assert_eq!(TaskUtils::releases_in_hyperperiod(&in_phase, hyperperiod), 3);
    assert_eq!(TaskUtils::releases_in_hyperperiod(&offset, hyperperiod), 3);
}

#[test]
fn rate_monotonic_order_is_stable() {
    let taskset = [
        Task::new_ms(0, 0, 6, 6, 2),
        Task::new_ms(1, 0, 4, 4, 1),
        Task::new_ms(2, 0, 4, 4, 2),
    ];

    let sorted = TaskUtils::rate_monotonic_order(&taskset);
    let ids: Vec<usize> = sorted.iter().map(|t| t.id).collect();

    assert_eq!(ids, vec![1, 2, 0]);
}
