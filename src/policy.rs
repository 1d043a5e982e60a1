//! Session outcome policies
//!
//! Recovery time and stress-event counts are not measured by the monitor; a
//! policy fills them in when a session completes. The seeded policy follows
//! the dashboard's placeholder distribution but is reproducible.

use crate::types::BiometricReading;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lower bound of the placeholder recovery-time draw (seconds, inclusive)
pub const MIN_RECOVERY_SECS: u32 = 180;

/// Upper bound of the placeholder recovery-time draw (seconds, exclusive)
pub const MAX_RECOVERY_SECS: u32 = 480;

/// Upper bound of the placeholder stress-event draw (exclusive)
pub const MAX_STRESS_EVENTS: u32 = 5;

/// Estimated outcome of a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub recovery_time: u32,
    pub stress_events: u32,
}

/// Trait for session outcome policies
pub trait OutcomePolicy {
    /// Produce the outcome for a non-empty batch of readings
    fn outcome(&mut self, readings: &[BiometricReading]) -> SessionOutcome;
}

/// Uniform draws from a seeded generator
#[derive(Debug, Clone)]
pub struct SeededOutcomePolicy {
    rng: StdRng,
}

impl SeededOutcomePolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed from OS entropy (non-reproducible)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl OutcomePolicy for SeededOutcomePolicy {
    fn outcome(&mut self, _readings: &[BiometricReading]) -> SessionOutcome {
        SessionOutcome {
            recovery_time: self.rng.gen_range(MIN_RECOVERY_SECS..MAX_RECOVERY_SECS),
            stress_events: self.rng.gen_range(0..MAX_STRESS_EVENTS),
        }
    }
}

/// Always returns the same outcome
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcomePolicy(pub SessionOutcome);

impl OutcomePolicy for FixedOutcomePolicy {
    fn outcome(&mut self, _readings: &[BiometricReading]) -> SessionOutcome {
        self.0
    }
}
