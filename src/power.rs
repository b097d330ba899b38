//! ## Processor power model
//!
//! #### Model:
//! - Seven discrete frequency/voltage operating points, frequencies
//!   normalised to the maximum
//! - Energy drawn over an interval: f · V² · t
//!
//! The two level tables form a single model and must be edited together.

use crate::prelude::*;

pub mod prelude {
    pub use super::{
        PowerModel,
        NUM_FREQ_LEVELS,
        FREQ_LEVELS,
        VOLTAGE_LEVELS,
    };
}

pub const NUM_FREQ_LEVELS: usize = 7;

pub const FREQ_LEVELS: [f64; NUM_FREQ_LEVELS] = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4];
pub const VOLTAGE_LEVELS: [f64; NUM_FREQ_LEVELS] = [5.0, 4.7, 4.4, 4.1, 3.8, 3.5, 3.2];

pub struct PowerModel;

impl PowerModel {
    /// Index of the slowest discrete level still meeting the required speed,
    /// i.e. the largest i with FREQ_LEVELS[i] >= alpha. Falls back to the
    /// maximum frequency when no level suffices.
    pub fn freq_index_for(alpha: Bandwidth) -> usize {
        (0..NUM_FREQ_LEVELS).rev()
            .find(|&i| FREQ_LEVELS[i] >= alpha)
            .unwrap_or(0)
    }

    pub fn lowest_freq_index() -> usize {
        NUM_FREQ_LEVELS - 1
    }

    pub fn lowest_frequency() -> f64 {
        FREQ_LEVELS[NUM_FREQ_LEVELS - 1]
    }

    /// Energy drawn while running `duration` milliseconds at the given level.
    pub fn energy(duration: f64, freq_index: usize) -> f64 {
        if duration <= TIME_EPS {
            return 0.0;
        }

        let frequency = FREQ_LEVELS[freq_index];
        let voltage = VOLTAGE_LEVELS[freq_index];

        frequency * voltage * voltage * duration
    }
}

// =============================================================================

#[test]
fn levels_are_descending_and_paired() {
    assert_eq!(FREQ_LEVELS.len(), VOLTAGE_LEVELS.len());
    assert!(FREQ_LEVELS.windows(2).all(|w| w[0] > w[1]));
    assert!(VOLTAGE_LEVELS.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn freq_index_picks_lowest_sufficient_level() {
    assert_eq!(PowerModel::freq_index_for(0.5), 5);
    assert_eq!(PowerModel::freq_index_for(0.583), 4);
    assert_eq!(PowerModel::freq_index_for(1.0), 0);
    assert_eq!(PowerModel::freq_index_for(0.1), 6);
}

#[test]
fn freq_index_saturates_at_maximum() {
    assert_eq!(PowerModel::freq_index_for(1.5), 0);
}

#[test]
fn energy_is_f_v_squared_t() {
    let energy = PowerModel::energy(10.0, 0);
    assert!((energy - 1.0 * 5.0 * 5.0 * 10.0).abs() < 1e-12);

    let idle = PowerModel::energy(10.0, PowerModel::lowest_freq_index());
    assert!((idle - 0.4 * 3.2 * 3.2 * 10.0).abs() < 1e-12);
}

#[test]
fn negligible_durations_draw_no_energy() {
    assert_eq!(PowerModel::energy(0.0, 0), 0.0);
    assert_eq!(PowerModel::energy(1e-10, 3), 0.0);
}
