use crate::prelude::*;

pub mod prelude {
    pub use super::{
        Job,
        JobId,
        JobPool,
        ReadyQueue,
        QueueView,
    };
}

pub type JobId = usize;

/// One release of a task. `task` is the position of the owning task in the
/// run's task slice; the remaining work is measured in milliseconds at full
/// speed and only ever decreases.
#[derive(Clone)]
#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    pub task: usize,
    pub release: Time,
    pub absolute_deadline: Time,
    pub remaining_work: f64,
    pub actual: Time,
}

/// Arena for the jobs of a single run. Identifiers are consecutive indices
/// starting at zero, so completed jobs stay addressable for reporting.
pub struct JobPool {
    jobs: Vec<Job>,
}

/// Released, not yet completed jobs in insertion order. Dispatch tie-breaks
/// rely on this order being stable, so removal never reorders the rest.
pub struct ReadyQueue {
    jobs: Vec<JobId>,
}

/// Read-only view of the queue state handed to the speed governors.
pub struct QueueView<'a> {
    pub tasks: &'a [Task],
    pub now: f64,
    pool: &'a JobPool,
    queue: &'a ReadyQueue,
}

// =============================================================================

impl JobPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { jobs: Vec::with_capacity(capacity) }
    }

    pub fn allocate(
        &mut self,
        task: usize,
        release: Time,
        absolute_deadline: Time,
        actual: Time
    ) -> JobId {
        let id = self.jobs.len();
        self.jobs.push(Job {
            id,
            task,
            release,
            absolute_deadline,
            remaining_work: actual.as_f64_ms(),
            actual,
        });

        id
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, id: JobId) -> &Job {
        &self.jobs[id]
    }

    pub fn get_mut(&mut self, id: JobId) -> &mut Job {
        &mut self.jobs[id]
    }
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn push(&mut self, job: JobId) {
        self.jobs.push(job);
    }

    pub fn remove(&mut self, job: JobId) {
        if let Some(position) = self.jobs.iter().position(|&id| id == job) {
            self.jobs.remove(position);
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = JobId> + '_ {
        self.jobs.iter().copied()
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> QueueView<'a> {
    pub fn new(
        tasks: &'a [Task],
        pool: &'a JobPool,
        queue: &'a ReadyQueue,
        now: f64
    ) -> Self {
        Self { tasks, now, pool, queue }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &'a Job> + '_ {
        self.queue.iter().map(|id| self.pool.get(id))
    }

    pub fn total_remaining_work(&self) -> f64 {
        self.jobs().map(|job| job.remaining_work).sum()
    }

    pub fn earliest_deadline(&self) -> Option<Time> {
        self.jobs().map(|job| job.absolute_deadline).min()
    }

    /// Remaining work of the outstanding job of the task at the given
    /// position, if one is in the queue.
    pub fn remaining_work_of_task(&self, task: usize) -> Option<f64> {
        self.jobs()
            .find(|job| job.task == task)
            .map(|job| job.remaining_work)
    }
}

// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with_jobs(deadlines: &[u64]) -> (JobPool, ReadyQueue) {
        let mut pool = JobPool::with_capacity(deadlines.len());
        let mut queue = ReadyQueue::new();

        for (task, &deadline) in deadlines.iter().enumerate() {
            let id = pool.allocate(
                task,
                Time::zero(),
                Time::millis(deadline),
                Time::millis(1),
            );
            queue.push(id);
        }

        (pool, queue)
    }

    #[test]
    fn job_identifiers_are_consecutive() {
        let (pool, _) = pool_with_jobs(&[10, 20, 30]);

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(0).id, 0);
        assert_eq!(pool.get(2).id, 2);
    }

    #[test]
    fn removal_preserves_insertion_order() {
        let (_, mut queue) = pool_with_jobs(&[10, 20, 30]);

        queue.remove(1);
        let order: Vec<JobId> = queue.iter().collect();

        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn view_aggregates_queue_state() {
        let tasks = [
            Task::new_ms(0, 0, 10, 10, 1),
            Task::new_ms(1, 0, 20, 20, 1),
        ];
        let (pool, queue) = pool_with_jobs(&[20, 10]);
        let view = QueueView::new(&tasks, &pool, &queue, 0.0);

        assert_eq!(view.earliest_deadline(), Some(Time::millis(10)));
        assert!((view.total_remaining_work() - 2.0).abs() < 1e-12);
        assert_eq!(view.remaining_work_of_task(1), Some(1.0));
        assert_eq!(view.remaining_work_of_task(5), None);
    }
}
