//! Device liveness evaluation
//!
//! A two-state judgment recomputed from scratch on every observation of the
//! most recent reading. There is no debounce, no hysteresis, and no state
//! distinct from Inactive for "never reported".

use chrono::{DateTime, Utc};

use crate::types::{LivenessState, Reading};

/// Maximum age of the latest reading for the device to count as alive
pub const MAX_READING_AGE_SECONDS: i64 = 3600;

/// Evaluate liveness from the most recent reading.
///
/// `Active` iff the reading exists, reported non-zero energy, and is at most
/// one hour old relative to `now`; `Inactive` otherwise.
pub fn evaluate(latest: Option<&Reading>, now: DateTime<Utc>) -> LivenessState {
    match latest {
        Some(reading)
            if reading.energy_used_kwh > 0.0
                && reading.age_seconds(now) <= MAX_READING_AGE_SECONDS =>
        {
            LivenessState::Active
        }
        _ => LivenessState::Inactive,
    }
}

/// The most recent reading in a (not necessarily sorted) history
pub fn latest_reading(readings: &[Reading]) -> Option<&Reading> {
    readings.iter().max_by_key(|r| r.timestamp)
}
