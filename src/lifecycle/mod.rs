//! Test-run lifecycle events
//!
//! Types describing what the host test runner delivers to the reporter:
//! a run start, a start/done pair per case and a run end.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single test case, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseOutcome {
    Passed,
    Failed,
    Pending,
    Disabled,
}

impl CaseOutcome {
    /// Whether the host may have skipped the start event for this outcome
    pub fn may_skip_start(&self) -> bool {
        matches!(self, CaseOutcome::Pending | CaseOutcome::Disabled)
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaseOutcome::Passed => "passed",
            CaseOutcome::Failed => "failed",
            CaseOutcome::Pending => "pending",
            CaseOutcome::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Result payload delivered with case events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    /// Full display name, including enclosing suites
    pub full_name: String,

    /// Case description without the suite prefix
    pub description: String,

    /// Case outcome. Only meaningful on `caseDone`; hosts send a placeholder on start.
    #[serde(default = "default_outcome")]
    pub outcome: CaseOutcome,
}

fn default_outcome() -> CaseOutcome {
    CaseOutcome::Pending
}

impl CaseResult {
    pub fn new(
        full_name: impl Into<String>,
        description: impl Into<String>,
        outcome: CaseOutcome,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            description: description.into(),
            outcome,
        }
    }
}

/// A lifecycle callback from the host test runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LifecycleEvent {
    RunStarted,
    CaseStarted { result: CaseResult },
    CaseDone { result: CaseResult },
    RunDone,
}

impl LifecycleEvent {
    /// Event name as used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::RunStarted => "runStarted",
            LifecycleEvent::CaseStarted { .. } => "caseStarted",
            LifecycleEvent::CaseDone { .. } => "caseDone",
            LifecycleEvent::RunDone => "runDone",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_done_event() {
        let line = r#"{"event":"caseDone","result":{"fullName":"login works","description":"works","outcome":"failed"}}"#;
        let event: LifecycleEvent = serde_json::from_str(line).unwrap();

        assert_eq!(
            event,
            LifecycleEvent::CaseDone {
                result: CaseResult::new("login works", "works", CaseOutcome::Failed),
            }
        );
        assert_eq!(event.name(), "caseDone");
    }

    #[test]
    fn test_parse_run_events_without_payload() {
        let event: LifecycleEvent = serde_json::from_str(r#"{"event":"runStarted"}"#).unwrap();
        assert_eq!(event, LifecycleEvent::RunStarted);
    }

    #[test]
    fn test_case_started_outcome_defaults() {
        let line = r#"{"event":"caseStarted","result":{"fullName":"a b","description":"b"}}"#;
        let event: LifecycleEvent = serde_json::from_str(line).unwrap();

        match event {
            LifecycleEvent::CaseStarted { result } => {
                assert_eq!(result.outcome, CaseOutcome::Pending)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_skippable_outcomes() {
        assert!(CaseOutcome::Pending.may_skip_start());
        assert!(CaseOutcome::Disabled.may_skip_start());
        assert!(!CaseOutcome::Passed.may_skip_start());
        assert!(!CaseOutcome::Failed.may_skip_start());
    }
}
