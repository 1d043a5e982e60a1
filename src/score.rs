//! Resilience score aggregation
//!
//! This module folds a session history into the dashboard's resilience
//! score. The score rests on three pillars:
//! - Resistance: average HRV relative to a population reference
//! - Recovery: inverse of average recovery time
//! - Stability: inverse of HRV spread across sessions
//!
//! Everything here is a pure function of the history slice.

use crate::session::running_mean;
use crate::types::{ResilienceScore, ResilienceTier, SessionData, WeeklyPoint};
use chrono::{Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Population reference HRV mapped to a resistance of 100
pub const REFERENCE_HRV: f64 = 85.0;

/// Recovery time (seconds) that still scores a full 100
pub const ELITE_RECOVERY_SECS: f64 = 180.0;

/// Recovery points lost per second above the elite threshold
pub const RECOVERY_PENALTY_PER_SEC: f64 = 60.0 / 420.0;

pub const RESISTANCE_WEIGHT: f64 = 0.35;
pub const RECOVERY_WEIGHT: f64 = 0.45;
pub const STABILITY_WEIGHT: f64 = 0.20;

/// Score reported before any session has been recorded
pub const BASELINE_SCORE: ResilienceScore = ResilienceScore {
    overall: 65.0,
    resistance: 60.0,
    recovery: 65.0,
    stability: 70.0,
};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Score aggregator over session histories
pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Compute the resilience score for a full history
    pub fn aggregate(history: &[SessionData]) -> ResilienceScore {
        if history.is_empty() {
            return BASELINE_SCORE;
        }

        let hrvs: Vec<f64> = history.iter().map(|s| s.avg_hrv).collect();
        let recoveries: Vec<f64> = history.iter().map(|s| f64::from(s.recovery_time)).collect();

        let resistance = mean(&hrvs) / REFERENCE_HRV * 100.0;
        let recovery =
            100.0 - (mean(&recoveries) - ELITE_RECOVERY_SECS) * RECOVERY_PENALTY_PER_SEC;
        let stability = 100.0 - population_std_dev(&hrvs) * 2.0;

        let overall = resistance * RESISTANCE_WEIGHT
            + recovery * RECOVERY_WEIGHT
            + stability * STABILITY_WEIGHT;

        ResilienceScore {
            overall: clamp_and_round(overall),
            resistance: clamp_and_round(resistance),
            recovery: clamp_and_round(recovery),
            stability: clamp_and_round(stability),
        }
    }

    /// Average SRI per weekday (Mon..Sun, UTC).
    ///
    /// Days without sessions fall back to `overall`.
    pub fn weekly_breakdown(history: &[SessionData], overall: f64) -> Vec<WeeklyPoint> {
        let mut means = [0.0_f64; 7];
        let mut counts = [0_usize; 7];

        for session in history {
            if let Some(at) = Utc.timestamp_millis_opt(session.date).single() {
                let idx = at.weekday().num_days_from_monday() as usize;
                counts[idx] += 1;
                means[idx] += (session.sri - means[idx]) / counts[idx] as f64;
            }
        }

        WEEKDAYS
            .iter()
            .enumerate()
            .map(|(i, day)| WeeklyPoint {
                day: (*day).to_string(),
                sri: if counts[i] > 0 {
                    means[i]
                } else {
                    overall
                },
            })
            .collect()
    }

    pub fn tier(score: &ResilienceScore) -> ResilienceTier {
        ResilienceTier::from_score(score.overall)
    }
}

/// Score, tier, and weekly chart for one history, as handed to the shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: ResilienceScore,
    pub tier: ResilienceTier,
    pub tier_label: String,
    pub weekly: Vec<WeeklyPoint>,
    pub session_count: usize,
}

impl ScoreReport {
    pub fn from_history(history: &[SessionData]) -> Self {
        let score = ScoreAggregator::aggregate(history);
        let tier = ScoreAggregator::tier(&score);
        Self {
            score,
            tier,
            tier_label: tier.label().to_string(),
            weekly: ScoreAggregator::weekly_breakdown(history, score.overall),
            session_count: history.len(),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    running_mean(values.iter().copied()).unwrap_or(0.0)
}

fn population_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Clamp to 0-100 and round to one decimal, ties to even (`82.25` -> `82.2`)
fn clamp_and_round(value: f64) -> f64 {
    (value.clamp(0.0, 100.0) * 10.0).round_ties_even() / 10.0
}
