//! Orchestration of the seven policy passes over one task set.
//!
//! Each pass starts from a fresh clone of the pristine task list, so no
//! invocation cursor or queue state carries over. Rate-monotonic passes run
//! on an ascending-period reordering; deadline-driven passes keep the
//! original order. Energies are normalised against the plain pass of the
//! same priority family.

use crate::prelude::*;

pub mod prelude {
    pub use super::{
        Campaign,
        CampaignResult,
        PolicyRow,
    };
}

/// The untouched task set plus the machinery to run and normalise all
/// policy passes against it.
pub struct Campaign {
    tasks: Vec<Task>,
}

/// One row of the final table.
#[derive(Clone)]
#[derive(Debug)]
#[derive(serde::Serialize)]
pub struct PolicyRow {
    pub policy: Policy,
    pub result: RunResult,
    pub normalized_energy: f64,
}

#[derive(Clone)]
#[derive(Debug)]
#[derive(serde::Serialize)]
pub struct CampaignResult {
    pub rows: Vec<PolicyRow>,
}

// =============================================================================

impl Campaign {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn hyperperiod(&self) -> Time {
        TaskUtils::hyperperiod(&self.tasks)
    }

    /// Run a single policy pass on a fresh copy of the task set.
    pub fn run_policy(
        &self,
        policy: Policy,
        trace: &mut dyn TraceSink
    ) -> Result<RunResult, SimError> {
        let tasks = match policy.family() {
            PriorityFamily::EarliestDeadline => self.tasks.clone(),
            PriorityFamily::RateMonotonic => TaskUtils::rate_monotonic_order(&self.tasks),
        };

        let mut simulation = Simulation::new(tasks, policy)?;
        Ok(simulation.run(trace))
    }

    /// Run every policy and normalise each energy against the plain pass of
    /// its family.
    pub fn run(&self, trace: &mut dyn TraceSink) -> Result<CampaignResult, SimError> {
        trace.taskset_loaded(&self.tasks, self.hyperperiod());
        tracing::info!(
            tasks = self.tasks.len(),
            hyperperiod_ms = self.hyperperiod().as_millis(),
            total_utilization = TaskUtils::total_utilization(&self.tasks),
            largest_utilization = TaskUtils::largest_utilization(&self.tasks),
            "campaign started"
        );

        let passes: Vec<(Policy, RunResult)> = Policy::all().into_iter()
            .map(|policy| Ok((policy, self.run_policy(policy, trace)?)))
            .collect::<Result<_, SimError>>()?;

        let baseline_energy = |family: PriorityFamily| -> f64 {
            passes.iter()
                .find(|(policy, _)| policy.family() == family && policy.is_baseline())
                .map(|(_, result)| result.total_energy)
                .unwrap_or(1.0)
        };

        let edf_baseline = baseline_energy(PriorityFamily::EarliestDeadline);
        let rm_baseline = baseline_energy(PriorityFamily::RateMonotonic);

        let rows = passes.into_iter()
            .map(|(policy, result)| {
                let baseline = match policy.family() {
                    PriorityFamily::EarliestDeadline => edf_baseline,
                    PriorityFamily::RateMonotonic => rm_baseline,
                };
                let normalized_energy =
                    if policy.is_baseline() { 1.0 } else { result.total_energy / baseline };

                PolicyRow { policy, result, normalized_energy }
            })
            .collect();

        Ok(CampaignResult { rows })
    }
}

// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn two_task_campaign() -> Campaign {
        Campaign::new(vec![
            Task::new_ms(0, 0, 10, 10, 2),
            Task::new_ms(1, 0, 20, 20, 4),
        ])
    }

    #[test]
    fn baselines_normalise_to_one() {
        let result = two_task_campaign().run(&mut NullTrace).unwrap();

        assert_eq!(result.rows.len(), 7);
        assert_eq!(result.rows[0].policy, Policy::plain_edf());
        assert_eq!(result.rows[0].normalized_energy, 1.0);
        assert_eq!(result.rows[4].policy, Policy::plain_rm());
        assert_eq!(result.rows[4].normalized_energy, 1.0);
    }

    #[test]
    fn scaled_policies_never_exceed_their_baseline_here() {
        let result = two_task_campaign().run(&mut NullTrace).unwrap();

        for row in &result.rows {
            assert!(row.normalized_energy <= 1.0 + 1e-9, "{}", row.policy);
            assert_eq!(row.result.deadline_misses, 0, "{}", row.policy);
        }
    }

    #[test]
    fn rate_monotonic_passes_accept_unsorted_input() {
        // The campaign reorders by period itself; the caller's order only
        // matters for the deadline-driven passes.
        let campaign = Campaign::new(vec![
            Task::new_ms(0, 0, 6, 6, 2),
            Task::new_ms(1, 0, 4, 4, 1),
        ]);

        let result = campaign.run_policy(Policy::plain_rm(), &mut NullTrace);

        assert!(result.is_ok());
    }

    #[test]
    fn passes_do_not_leak_state_into_each_other() {
        let campaign = two_task_campaign();

        let first = campaign.run(&mut NullTrace).unwrap();
        let second = campaign.run(&mut NullTrace).unwrap();

        for (a, b) in first.rows.iter().zip(&second.rows) {
            assert_eq!(a.result, b.result);
            assert_eq!(a.normalized_energy, b.normalized_energy);
        }
    }

    #[test]
    fn static_edf_saves_energy_on_the_two_task_set() {
        let result = two_task_campaign().run(&mut NullTrace).unwrap();

        let static_edf = &result.rows[1];
        assert_eq!(static_edf.policy, Policy::static_edf());
        assert!(static_edf.normalized_energy < 1.0);
    }
}
