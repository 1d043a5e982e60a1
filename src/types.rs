//! Core types for Symbiome Core
//!
//! This module defines the data structures the dashboard shell exchanges with
//! the core: raw biometric readings, completed session records, the user
//! profile, and the aggregate resilience score.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One instantaneous biometric sample.
///
/// Values are not bounds-checked; the dashboard uses a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricReading {
    /// Heart-rate-variability proxy
    pub hrv: f64,
    /// Galvanic-skin-response proxy (arousal)
    pub gsr: f64,
    /// Facial calmness score
    pub facial_calm: f64,
}

impl BiometricReading {
    pub fn new(hrv: f64, gsr: f64, facial_calm: f64) -> Self {
        Self {
            hrv,
            gsr,
            facial_calm,
        }
    }
}

/// Session type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Stress,
    Training,
    Passive,
    Custom,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Stress => "stress",
            SessionType::Training => "training",
            SessionType::Passive => "passive",
            SessionType::Custom => "custom",
        }
    }
}

/// Immutable record of one completed monitoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Unique session identifier (`session-<epoch ms>`)
    pub id: String,
    /// Completion time (epoch milliseconds)
    pub date: i64,
    /// Number of readings in the session
    pub duration: usize,
    #[serde(rename = "avgHRV", with = "non_finite")]
    pub avg_hrv: f64,
    #[serde(rename = "avgGSR", with = "non_finite")]
    pub avg_gsr: f64,
    #[serde(with = "non_finite")]
    pub avg_facial_calm: f64,
    /// Composite resilience index
    #[serde(with = "non_finite")]
    pub sri: f64,
    /// Estimated recovery time (seconds)
    pub recovery_time: u32,
    pub stress_events: u32,
    #[serde(rename = "type")]
    pub session_type: SessionType,
}

/// Gamification state shown in the dashboard header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub level: u32,
    pub xp: u64,
    /// Consecutive active days
    pub streak: u32,
    pub total_sessions: u64,
    pub achievements: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Researcher".to_string(),
            level: 5,
            xp: 4250,
            streak: 7,
            total_sessions: 42,
            achievements: Vec::new(),
        }
    }
}

/// Serde helpers for session floats.
///
/// JSON has no literal for infinities or NaN, so those are written as the
/// strings `"Infinity"`, `"-Infinity"` and `"NaN"`. A `null` reads back as NaN.
mod non_finite {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, \"Infinity\", \"-Infinity\" or \"NaN\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
            Ok(f64::NAN)
        }
    }
}

/// History-level resilience score with its three pillars (each 0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResilienceScore {
    pub overall: f64,
    /// Stress absorption, from average HRV
    pub resistance: f64,
    /// Return-to-baseline velocity, from recovery time
    pub recovery: f64,
    /// Consistency of regulation, from HRV spread
    pub stability: f64,
}

/// Qualitative band for an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResilienceTier {
    Elite,
    Dynamic,
    Functional,
    Vulnerable,
}

impl ResilienceTier {
    pub fn from_score(score: f64) -> Self {
        if score > 85.0 {
            ResilienceTier::Elite
        } else if score > 70.0 {
            ResilienceTier::Dynamic
        } else if score > 50.0 {
            ResilienceTier::Functional
        } else {
            ResilienceTier::Vulnerable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResilienceTier::Elite => "Elite (Nervous System Fortified)",
            ResilienceTier::Dynamic => "Dynamic (High Performance)",
            ResilienceTier::Functional => "Functional (Baseline Stable)",
            ResilienceTier::Vulnerable => "Vulnerable (Intervention Advised)",
        }
    }
}

/// One point of the weekly SRI chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPoint {
    /// Short weekday name (`Mon`..`Sun`)
    pub day: String,
    pub sri: f64,
}

/// Dashboard panels selectable from the navigation sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Home,
    Monitor,
    PassiveMonitoring,
    CustomStress,
    Train,
    ClosedLoop,
    Cognitive,
    Predictive,
    Twin,
    TwinAdvanced,
    Forecast,
    Journal,
    NlpJournal,
    RqTracker,
    Environment,
    ScientificAnalysis,
    Analysis,
    Glove,
    ClinicalVault,
    Community,
    CommunityMapping,
    AdvancedFeatures,
    Learn,
    Sandbox,
    Future,
    Settings,
}

impl Tab {
    /// Navigation order
    pub const ALL: [Tab; 26] = [
        Tab::Home,
        Tab::Monitor,
        Tab::PassiveMonitoring,
        Tab::CustomStress,
        Tab::Train,
        Tab::ClosedLoop,
        Tab::Cognitive,
        Tab::Predictive,
        Tab::Twin,
        Tab::TwinAdvanced,
        Tab::Forecast,
        Tab::Journal,
        Tab::NlpJournal,
        Tab::RqTracker,
        Tab::Environment,
        Tab::ScientificAnalysis,
        Tab::Analysis,
        Tab::Glove,
        Tab::ClinicalVault,
        Tab::Community,
        Tab::CommunityMapping,
        Tab::AdvancedFeatures,
        Tab::Learn,
        Tab::Sandbox,
        Tab::Future,
        Tab::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Home => "home",
            Tab::Monitor => "monitor",
            Tab::PassiveMonitoring => "passivemonitoring",
            Tab::CustomStress => "customstress",
            Tab::Train => "train",
            Tab::ClosedLoop => "closedloop",
            Tab::Cognitive => "cognitive",
            Tab::Predictive => "predictive",
            Tab::Twin => "twin",
            Tab::TwinAdvanced => "twinadvanced",
            Tab::Forecast => "forecast",
            Tab::Journal => "journal",
            Tab::NlpJournal => "nlpjournal",
            Tab::RqTracker => "rqtracker",
            Tab::Environment => "environment",
            Tab::ScientificAnalysis => "scientificanalysis",
            Tab::Analysis => "analysis",
            Tab::Glove => "glove",
            Tab::ClinicalVault => "clinicalvault",
            Tab::Community => "community",
            Tab::CommunityMapping => "communitymapping",
            Tab::AdvancedFeatures => "advancedfeatures",
            Tab::Learn => "learn",
            Tab::Sandbox => "sandbox",
            Tab::Future => "future",
            Tab::Settings => "settings",
        }
    }

    /// Sidebar label
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Home => "Dashboard",
            Tab::Monitor => "Live Monitor",
            Tab::PassiveMonitoring => "Passive Sentinel",
            Tab::CustomStress => "Custom Activities",
            Tab::Train => "Biofeedback Training",
            Tab::ClosedLoop => "Closed-Loop System",
            Tab::Cognitive => "Cognitive Tests",
            Tab::Predictive => "Predictive Engine",
            Tab::Twin => "Digital Twin (Basic)",
            Tab::TwinAdvanced => "Digital Twin (In-Silico)",
            Tab::Forecast => "Resilience Forecast",
            Tab::Journal => "Emotional Journal (Basic)",
            Tab::NlpJournal => "NLP Sentiment AI",
            Tab::RqTracker => "Resilience Quotient",
            Tab::Environment => "Environment Tracker",
            Tab::ScientificAnalysis => "Scientific Analysis",
            Tab::Analysis => "Research Dashboard",
            Tab::Glove => "Symbiome Glove",
            Tab::ClinicalVault => "Clinical Data Vault",
            Tab::Community => "Community Cloud (Basic)",
            Tab::CommunityMapping => "Resilience Mapping",
            Tab::AdvancedFeatures => "Advanced Features",
            Tab::Learn => "Educational Portal",
            Tab::Sandbox => "Simulation Sandbox",
            Tab::Future => "Future Vision",
            Tab::Settings => "Settings & Privacy",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .iter()
            .copied()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| ComputeError::UnknownTab(s.to_string()))
    }
}
