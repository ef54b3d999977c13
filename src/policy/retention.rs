//! Keep-or-discard decisions for per-case recordings

use crate::config::ReporterConfig;
use crate::lifecycle::CaseOutcome;
use serde::{Deserialize, Serialize};

/// What to do with a stopped per-case recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RetentionDecision {
    /// Keep the file and announce its location
    Keep,
    /// Delete the file; it must exist
    Discard,
    /// Delete the file if the case ever got recorded
    DiscardIfPresent,
}

impl RetentionDecision {
    pub fn keeps(&self) -> bool {
        matches!(self, RetentionDecision::Keep)
    }
}

/// Decide what happens to a case's recording.
///
/// Pending and disabled cases may never have started a capture, so their
/// file is only removed when present.
pub fn decide(outcome: CaseOutcome, config: &ReporterConfig) -> RetentionDecision {
    match outcome {
        CaseOutcome::Failed => RetentionDecision::Keep,
        CaseOutcome::Passed if config.save_successful_cases() => RetentionDecision::Keep,
        CaseOutcome::Passed => RetentionDecision::Discard,
        CaseOutcome::Pending | CaseOutcome::Disabled => RetentionDecision::DiscardIfPresent,
    }
}
