use crate::prelude::*;

pub mod prelude {
    pub use super::SpeedGovernor;
}

/// Speed-setting strategy driven by the simulation engine.
///
/// The engine calls [`boot_speed`](Self::boot_speed) once before the first
/// event, then, for dynamic governors, feeds every release and completion
/// through [`note_release`](Self::note_release) /
/// [`note_completion`](Self::note_completion) and asks for a fresh required
/// speed at each such event. The returned speed is a fraction of the maximum
/// frequency; the engine discretises it to the frequency table.
pub trait SpeedGovernor {
    /// Name of the speed-setting strategy.
    fn governor_name(&self) -> &str;

    /// Required speed chosen at t = 0, before any release.
    fn boot_speed(&mut self, taskset: &[Task]) -> Bandwidth;

    /// Whether the required speed is recomputed at release and completion
    /// events. Static governors keep their boot speed for the whole run.
    fn is_dynamic(&self) -> bool {
        false
    }

    /// Observe a job release of the given task.
    fn note_release(&mut self, _task: &Task) {}

    /// Observe a job completion of the given task.
    fn note_completion(&mut self, _task: &Task, _job: &Job) {}

    /// Recompute the required speed from the current queue state.
    fn required_speed(&mut self, _view: &QueueView) -> Bandwidth {
        1.0
    }
}
