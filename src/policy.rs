use crate::prelude::*;

pub mod prelude {
    pub use super::governor::prelude::*;
    pub use super::{
        Policy,
        PolicyError,
        PriorityFamily,
        SpeedScaling,
    };
}

pub mod governor;

pub mod plain;
pub mod static_edf;
pub mod static_rm;
pub mod cc_edf;
pub mod cc_rm;
pub mod look_ahead;

/// Priority discipline used to pick the running job from the ready queue.
#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub enum PriorityFamily {
    EarliestDeadline,
    RateMonotonic,
}

/// Speed-setting strategy: when and how the required speed is chosen.
#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub enum SpeedScaling {
    /// Fixed at the maximum frequency for the whole run.
    Plain,
    /// Chosen once at t = 0 from the task parameters.
    Static,
    /// Recomputed at every release and completion, reclaiming unused cycles.
    CycleConserving,
    /// Recomputed at every release and completion from the aggregate
    /// remaining work and the nearest deadline.
    LookAhead,
}

/// A scheduling policy is a priority discipline paired with a speed-setting
/// strategy. The two axes are orthogonal, except that look-ahead scaling is
/// only defined for the deadline-driven family.
#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub struct Policy {
    family: PriorityFamily,
    scaling: SpeedScaling,
}

#[derive(Clone)]
#[derive(Debug)]
pub enum PolicyError {
    UnsupportedCombination(PriorityFamily, SpeedScaling),
}

// =============================================================================

impl Policy {
    pub fn new(family: PriorityFamily, scaling: SpeedScaling) -> Result<Self, PolicyError> {
        match (family, scaling) {
            (PriorityFamily::RateMonotonic, SpeedScaling::LookAhead) =>
                Err(PolicyError::UnsupportedCombination(family, scaling)),
            _ => Ok(Self { family, scaling }),
        }
    }

    pub fn plain_edf() -> Self {
        Self { family: PriorityFamily::EarliestDeadline, scaling: SpeedScaling::Plain }
    }

    pub fn static_edf() -> Self {
        Self { family: PriorityFamily::EarliestDeadline, scaling: SpeedScaling::Static }
    }

    pub fn cc_edf() -> Self {
        Self { family: PriorityFamily::EarliestDeadline, scaling: SpeedScaling::CycleConserving }
    }

    pub fn la_edf() -> Self {
        Self { family: PriorityFamily::EarliestDeadline, scaling: SpeedScaling::LookAhead }
    }

    pub fn plain_rm() -> Self {
        Self { family: PriorityFamily::RateMonotonic, scaling: SpeedScaling::Plain }
    }

    pub fn static_rm() -> Self {
        Self { family: PriorityFamily::RateMonotonic, scaling: SpeedScaling::Static }
    }

    pub fn cc_rm() -> Self {
        Self { family: PriorityFamily::RateMonotonic, scaling: SpeedScaling::CycleConserving }
    }

    /// The seven exercised policies, in reporting order.
    pub fn all() -> [Policy; 7] {
        [
            Self::plain_edf(),
            Self::static_edf(),
            Self::cc_edf(),
            Self::la_edf(),
            Self::plain_rm(),
            Self::static_rm(),
            Self::cc_rm(),
        ]
    }

    pub fn family(&self) -> PriorityFamily {
        self.family
    }

    pub fn scaling(&self) -> SpeedScaling {
        self.scaling
    }

    pub fn is_baseline(&self) -> bool {
        self.scaling == SpeedScaling::Plain
    }

    pub fn governor(&self) -> Box<dyn SpeedGovernor> {
        use PriorityFamily::*;
        use SpeedScaling::*;

        match (self.scaling, self.family) {
            (Plain, _) => Box::new(plain::Governor),
            (Static, EarliestDeadline) => Box::new(static_edf::Governor),
            (Static, RateMonotonic) => Box::new(static_rm::Governor),
            (CycleConserving, EarliestDeadline) => Box::new(cc_edf::Governor::new()),
            (CycleConserving, RateMonotonic) => Box::new(cc_rm::Governor),
            (LookAhead, _) => Box::new(look_ahead::Governor),
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use PriorityFamily::*;
        use SpeedScaling::*;

        let name = match (self.family, self.scaling) {
            (EarliestDeadline, Plain) => "Plain EDF",
            (EarliestDeadline, Static) => "Static EDF",
            (EarliestDeadline, CycleConserving) => "ccEDF",
            (EarliestDeadline, LookAhead) => "LAEDF",
            (RateMonotonic, Plain) => "Plain RM",
            (RateMonotonic, Static) => "Static RM",
            (RateMonotonic, CycleConserving) => "ccRM",
            (RateMonotonic, LookAhead) => "LARM (unsupported)",
        };

        write!(f, "{name}")
    }
}

impl serde::Serialize for Policy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer {
        self.to_string().serialize(serializer)
    }
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::UnsupportedCombination(family, scaling) =>
                write!(f, "Policy error: {scaling:?} scaling is not defined for the {family:?} family"),
        }
    }
}

impl std::error::Error for PolicyError {}

// =============================================================================

#[test]
fn look_ahead_rate_monotonic_is_rejected() {
    assert!(Policy::new(PriorityFamily::RateMonotonic, SpeedScaling::LookAhead).is_err());
    assert!(Policy::new(PriorityFamily::EarliestDeadline, SpeedScaling::LookAhead).is_ok());
}

#[test]
fn reporting_order_starts_with_the_baselines_of_each_family() {
    let all = Policy::all();

    assert_eq!(all[0], Policy::plain_edf());
    assert_eq!(all[4], Policy::plain_rm());
    assert!(all[0].is_baseline());
    assert!(!all[1].is_baseline());
}

#[test]
fn policy_names_match_the_report_labels() {
    let names: Vec<String> = Policy::all().iter().map(Policy::to_string).collect();

    assert_eq!(names, vec![
        "Plain EDF", "Static EDF", "ccEDF", "LAEDF",
        "Plain RM", "Static RM", "ccRM",
    ]);
}
