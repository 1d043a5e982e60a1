//! Error types for Symbiome Core
//!
//! The scoring core itself never fails; these errors belong to the outer
//! surfaces (reading ingestion, state snapshots, configuration).

use thiserror::Error;

/// Errors that can occur around the computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse readings: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid state snapshot: {0}")]
    InvalidState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown dashboard tab: {0}")]
    UnknownTab(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
