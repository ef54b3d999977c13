//! Error types and handling
//!
//! Common error types used across the reporter. Every variant propagates to
//! the lifecycle handler that triggered it; nothing is retried internally.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Reporter-wide error type
#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Illegal {event} event while {state}")]
    StateViolation { event: &'static str, state: String },

    #[error("Failed to launch capture process: {0}")]
    LaunchFailure(String),

    #[error("Recorded artifact is missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to terminate capture process: {0}")]
    Termination(String),

    #[error("Unreadable lifecycle event: {0}")]
    InvalidEvent(String),
}

impl ReporterError {
    /// Build a state violation for `event` observed in `state`
    pub fn state_violation(event: &'static str, state: impl ToString) -> Self {
        Self::StateViolation {
            event,
            state: state.to_string(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            ReporterError::Configuration(_) => "CONFIGURATION_ERROR",
            ReporterError::StateViolation { .. } => "STATE_VIOLATION",
            ReporterError::LaunchFailure(_) => "LAUNCH_FAILURE",
            ReporterError::ArtifactMissing(_) => "ARTIFACT_MISSING",
            ReporterError::WriteFailure { .. } => "WRITE_FAILURE",
            ReporterError::Termination(_) => "TERMINATION_FAILURE",
            ReporterError::InvalidEvent(_) => "INVALID_EVENT",
        }
    }
}

/// Error response for the host process
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&ReporterError> for ErrorResponse {
    fn from(error: &ReporterError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using ReporterError
pub type ReporterResult<T> = Result<T, ReporterError>;
