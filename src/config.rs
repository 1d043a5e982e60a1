//! Aggregator configuration

use crate::error::ComputeError;
use crate::prompt::DEFAULT_COACH_DELAY;
use crate::types::UserProfile;
use serde::{Deserialize, Serialize};

/// Runtime configuration for a [`ResilienceAggregator`](crate::ResilienceAggregator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Seed for the outcome policy; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Delay before the coach prompt fires (milliseconds)
    pub coach_delay_ms: u64,
    /// Profile the store starts from
    pub profile: UserProfile,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            coach_delay_ms: DEFAULT_COACH_DELAY.as_millis() as u64,
            profile: UserProfile::default(),
        }
    }
}

impl AggregatorConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        serde_json::from_str(json).map_err(|e| ComputeError::InvalidConfig(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}
