//! Symbiome Core - On-device resilience scoring for the Symbiome dashboard
//!
//! Core turns batches of biometric readings (HRV, GSR, facial calmness) into
//! session records and folds the session history into a resilience score:
//! outcome estimation → session derivation → store update → score aggregation.
//!
//! ## Modules
//!
//! - **Aggregator**: Stateful entry point owning the dashboard store
//! - **Score**: Pure history-level scoring (pillars, tier, weekly chart)
//! - **State**: Dashboard store and its reducer transitions

pub mod aggregator;
pub mod config;
pub mod error;
pub mod policy;
pub mod prompt;
pub mod readings;
pub mod score;
pub mod session;
pub mod state;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregator::{aggregate_score, ResilienceAggregator, StateSnapshot};
pub use config::AggregatorConfig;
pub use error::ComputeError;
pub use policy::{FixedOutcomePolicy, OutcomePolicy, SeededOutcomePolicy, SessionOutcome};
pub use readings::ReadingParser;
pub use state::{Action, AppState};
pub use types::{
    BiometricReading, ResilienceScore, ResilienceTier, SessionData, SessionType, Tab,
    UserProfile, WeeklyPoint,
};

/// Core version embedded in snapshots and reports
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "symbiome-core";
