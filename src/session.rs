//! Session derivation
//!
//! This module turns a batch of biometric readings into a session record:
//! - Per-signal arithmetic means
//! - Session resilience index (SRI)

use crate::policy::SessionOutcome;
use crate::types::{BiometricReading, SessionData, SessionType};
use chrono::{DateTime, Utc};

/// SRI weight applied to average HRV
pub const SRI_HRV_WEIGHT: f64 = 0.35;

/// SRI weight applied to inverted average GSR
pub const SRI_GSR_WEIGHT: f64 = 0.30;

/// SRI weight applied to average facial calmness
pub const SRI_FACIAL_WEIGHT: f64 = 0.35;

/// Per-signal means over a batch of readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalAverages {
    pub hrv: f64,
    pub gsr: f64,
    pub facial_calm: f64,
}

/// Session deriver for computing session records
pub struct SessionDeriver;

impl SessionDeriver {
    /// Derive a session record, or `None` when there are no readings.
    ///
    /// `id` must already be unique within the history it will join.
    pub fn derive(
        readings: &[BiometricReading],
        outcome: SessionOutcome,
        id: String,
        completed_at: DateTime<Utc>,
    ) -> Option<SessionData> {
        let averages = compute_averages(readings)?;

        Some(SessionData {
            id,
            date: completed_at.timestamp_millis(),
            duration: readings.len(),
            avg_hrv: averages.hrv,
            avg_gsr: averages.gsr,
            avg_facial_calm: averages.facial_calm,
            sri: compute_sri(&averages),
            recovery_time: outcome.recovery_time,
            stress_events: outcome.stress_events,
            session_type: SessionType::Stress,
        })
    }
}

/// Arithmetic mean of each signal.
///
/// Means are accumulated incrementally, so finite readings always yield
/// finite means even near `f64::MAX`.
pub fn compute_averages(readings: &[BiometricReading]) -> Option<SignalAverages> {
    if readings.is_empty() {
        return None;
    }

    Some(SignalAverages {
        hrv: running_mean(readings.iter().map(|r| r.hrv))?,
        gsr: running_mean(readings.iter().map(|r| r.gsr))?,
        facial_calm: running_mean(readings.iter().map(|r| r.facial_calm))?,
    })
}

/// Incremental mean (`m += (x - m) / k`), `None` for an empty sequence
pub(crate) fn running_mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut mean = 0.0;
    let mut count = 0usize;
    for value in values {
        count += 1;
        mean += (value - mean) / count as f64;
    }
    (count > 0).then_some(mean)
}

/// Session resilience index.
///
/// GSR is inverted against a 0-100 scale so that arousal lowers the score.
pub fn compute_sri(averages: &SignalAverages) -> f64 {
    averages.hrv * SRI_HRV_WEIGHT
        + (100.0 - averages.gsr) * SRI_GSR_WEIGHT
        + averages.facial_calm * SRI_FACIAL_WEIGHT
}
