//! Per-event trace and report writing.
//!
//! The engine publishes every event through the [`TraceSink`] collaborator;
//! callers decide whether events end up in a report file, a speed profile,
//! or nowhere.

use crate::prelude::*;

pub mod prelude {
    pub use super::{
        TraceSink,
        NullTrace,
        TextTrace,
        SpeedTrace,
        write_normalized_table,
    };
}

/// Observer of simulation events. All methods default to no-ops so sinks
/// implement only what they care about.
pub trait TraceSink {
    fn taskset_loaded(&mut self, _taskset: &[Task], _hyperperiod: Time) {}

    fn run_started(&mut self, _policy: &Policy, _required: Bandwidth, _alpha: f64) {}

    fn job_released(&mut self, _now: f64, _job: &Job, _task: &Task) {}

    fn speed_changed(&mut self, _now: f64, _old_alpha: f64, _new_alpha: f64, _required: Bandwidth) {}

    fn job_scheduled(&mut self, _now: f64, _job: &Job, _task: &Task) {}

    fn processor_idle(&mut self, _now: f64, _duration: f64) {}

    fn job_completed(&mut self, _now: f64, _job: &Job, _task: &Task) {}

    fn deadline_missed(&mut self, _now: f64, _job: &Job, _task: &Task) {}

    fn run_finished(&mut self, _policy: &Policy, _hyperperiod: Time, _result: &RunResult) {}
}

/// Sink that drops every event.
pub struct NullTrace;

impl TraceSink for NullTrace {}

/// Sink writing the human-readable report. Write failures are dropped so a
/// full disk cannot distort the simulation itself; callers that care check
/// the stream afterwards.
pub struct TextTrace<W: std::io::Write> {
    out: W,
}

impl<W: std::io::Write> TextTrace<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: std::io::Write> TraceSink for TextTrace<W> {
    fn taskset_loaded(&mut self, taskset: &[Task], hyperperiod: Time) {
        let _ = writeln!(self.out, "\nTask set loaded:");
        for task in taskset {
            let _ = writeln!(self.out,
                "T{}: phase={}, period={}, deadline={}, wcet={} (util={:.3})",
                task.id + 1,
                task.phase.as_millis(),
                task.period.as_millis(),
                task.deadline.as_millis(),
                task.wcet.as_millis(),
                task.get_utilization(),
            );
        }
        let _ = writeln!(self.out, "Hyperperiod: {} ms\n", hyperperiod.as_millis());
    }

    fn run_started(&mut self, policy: &Policy, required: Bandwidth, alpha: f64) {
        let _ = writeln!(self.out, "\n=== SIMULATION: {policy} ===");
        let _ = match policy.scaling() {
            SpeedScaling::Plain =>
                writeln!(self.out, "   T=0.0: Freq fixed at {alpha:.3}"),
            SpeedScaling::Static =>
                writeln!(self.out, "   T=0.0: {policy} requires {required:.3} -> Freq set to {alpha:.3}"),
            SpeedScaling::CycleConserving | SpeedScaling::LookAhead =>
                writeln!(self.out, "   T=0.0: Dynamic policy initial speed: {alpha:.3}"),
        };
    }

    fn job_released(&mut self, now: f64, job: &Job, task: &Task) {
        let _ = writeln!(self.out,
            "   T={:.1}: Released Job{}(T{}, actual={}, deadline={})",
            now, job.id, task.id + 1,
            job.actual.as_millis(), job.absolute_deadline.as_millis(),
        );
    }

    fn speed_changed(&mut self, now: f64, old_alpha: f64, new_alpha: f64, required: Bandwidth) {
        let _ = writeln!(self.out,
            "   T={now:.1}: Freq change: {old_alpha:.3} -> {new_alpha:.3} (util req: {required:.3})",
        );
    }

    fn job_scheduled(&mut self, now: f64, job: &Job, task: &Task) {
        let _ = writeln!(self.out, "   T={:.1}: Scheduled Job{}(T{})", now, job.id, task.id + 1);
    }

    fn processor_idle(&mut self, now: f64, duration: f64) {
        let _ = writeln!(self.out,
            "   T={now:.1}: IDLE for {duration:.1}ms (consuming energy at lowest freq)",
        );
    }

    fn job_completed(&mut self, now: f64, job: &Job, task: &Task) {
        let _ = writeln!(self.out,
            "   T={:.1}: Completed Job{}(T{}) actual={}",
            now, job.id, task.id + 1, job.actual.as_millis(),
        );
    }

    fn deadline_missed(&mut self, now: f64, job: &Job, task: &Task) {
        let _ = writeln!(self.out,
            "   T={:.1}: *** DEADLINE MISS *** Job{}(T{})",
            now, job.id, task.id + 1,
        );
    }

    fn run_finished(&mut self, policy: &Policy, hyperperiod: Time, result: &RunResult) {
        let _ = writeln!(self.out, "\n--- RESULTS for {policy} ---");
        let _ = writeln!(self.out, "Hyperperiod: {} ms", hyperperiod.as_millis());
        let _ = writeln!(self.out, "Jobs: {}, Decision points: {}",
            result.jobs, result.decision_points);
        let _ = writeln!(self.out, "Preemptions: {}, Context switches: {}",
            result.preemptions, result.context_switches);
        let _ = writeln!(self.out, "Deadline misses: {}", result.deadline_misses);
        let _ = writeln!(self.out, "Total energy: {:.2}", result.total_energy);
    }
}

/// Sink recording the speed profile of a run as (time, alpha) samples, one
/// at boot and one per frequency change.
pub struct SpeedTrace {
    samples: Vec<(f64, f64)>,
}

impl SpeedTrace {
    pub fn new() -> Self {
        Self { samples: Vec::new() }
    }

    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    pub fn write_tsv<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "Time\tAlpha")?;
        for (time, alpha) in &self.samples {
            writeln!(out, "{time:.1}\t{alpha:.3}")?;
        }

        Ok(())
    }
}

impl Default for SpeedTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for SpeedTrace {
    fn run_started(&mut self, _policy: &Policy, _required: Bandwidth, alpha: f64) {
        self.samples.clear();
        self.samples.push((0.0, alpha));
    }

    fn speed_changed(&mut self, now: f64, _old_alpha: f64, new_alpha: f64, _required: Bandwidth) {
        self.samples.push((now, new_alpha));
    }
}

/// Write the final normalised-energy table, one labelled row per policy.
pub fn write_normalized_table<W: std::io::Write>(
    out: &mut W,
    rows: &[PolicyRow]
) -> std::io::Result<()> {
    writeln!(out, "\n--- FINAL NORMALIZED ENERGY RESULTS ---")?;
    for row in rows {
        writeln!(out, "{:<12}: {:.3}", row.policy.to_string(), row.normalized_energy)?;
    }

    Ok(())
}

// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_trace_formats_the_event_lines() {
        let task = Task::new_ms(1, 0, 6, 6, 2);
        let job = Job {
            id: 3,
            task: 1,
            release: Time::millis(6),
            absolute_deadline: Time::millis(12),
            remaining_work: 2.0,
            actual: Time::millis(2),
        };

        let mut trace = TextTrace::new(Vec::new());
        trace.job_released(6.0, &job, &task);
        trace.job_scheduled(6.0, &job, &task);
        trace.processor_idle(8.0, 4.0);

        let output = String::from_utf8(trace.into_inner()).unwrap();
        assert!(output.contains("T=6.0: Released Job3(T2, actual=2, deadline=12)"));
        assert!(output.contains("T=6.0: Scheduled Job3(T2)"));
        assert!(output.contains("T=8.0: IDLE for 4.0ms"));
    }

    #[test]
    fn speed_trace_samples_boot_and_changes() {
        let mut trace = SpeedTrace::new();
        trace.run_started(&Policy::cc_rm(), 1.0, 1.0);
        trace.speed_changed(4.0, 1.0, 0.6, 0.583);

        assert_eq!(trace.samples(), &[(0.0, 1.0), (4.0, 0.6)]);

        let mut tsv = Vec::new();
        trace.write_tsv(&mut tsv).unwrap();
        let tsv = String::from_utf8(tsv).unwrap();

        assert!(tsv.starts_with("Time\tAlpha\n"));
        assert!(tsv.contains("4.0\t0.600"));
    }
}
