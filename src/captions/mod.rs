//! Caption track for whole-run recordings
//!
//! One cue per case, timed against the moment the run recording started,
//! so a single video can be scrubbed case by case.

pub mod srt;

pub use srt::{render_srt, timecode};

use crate::capture::Clock;
use crate::lifecycle::CaseOutcome;
use crate::utils::error::{ReporterError, ReporterResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A sealed caption entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleCue {
    /// 1-based, in emission order
    pub sequence_id: u32,
    /// Milliseconds since run start
    pub start_offset_ms: u64,
    /// Milliseconds since run start, never before `start_offset_ms`
    pub end_offset_ms: u64,
    pub text: String,
}

/// A cue opened by a case start and not yet sealed
#[derive(Debug, Clone, Copy)]
struct OpenCue {
    sequence_id: u32,
    start_offset_ms: u64,
}

/// Accumulates caption cues over a run
pub struct CaptionTimelineBuilder {
    clock: Arc<dyn Clock>,
    origin_ms: Option<u64>,
    cues: Vec<SubtitleCue>,
    open: Option<OpenCue>,
}

impl CaptionTimelineBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            origin_ms: None,
            cues: Vec::new(),
            open: None,
        }
    }

    /// Reset the timeline and take the current instant as offset origin
    pub fn on_run_start(&mut self) {
        self.origin_ms = Some(self.clock.now_ms());
        self.cues.clear();
        self.open = None;
    }

    /// Open a cue for the case that just started
    pub fn on_case_start(&mut self) -> ReporterResult<()> {
        if let Some(open) = self.open {
            return Err(ReporterError::state_violation(
                "caseStarted",
                format!("caption cue {} is still open", open.sequence_id),
            ));
        }
        let start_offset_ms = self.offset_now("caseStarted")?;
        self.open = Some(OpenCue {
            sequence_id: self.cues.len() as u32 + 1,
            start_offset_ms,
        });
        Ok(())
    }

    /// Seal the open cue with the case outcome.
    ///
    /// Returns `Ok(false)` when a pending or disabled case ends without ever
    /// having started; any other case ending without an open cue is an error.
    pub fn on_case_end(&mut self, outcome: CaseOutcome, description: &str) -> ReporterResult<bool> {
        let Some(open) = self.open.take() else {
            if outcome.may_skip_start() {
                tracing::debug!("No caption for {} case {:?}", outcome, description);
                return Ok(false);
            }
            return Err(ReporterError::state_violation(
                "caseDone",
                "no caption cue is open",
            ));
        };

        let end_offset_ms = self.offset_now("caseDone")?.max(open.start_offset_ms);
        self.cues.push(SubtitleCue {
            sequence_id: open.sequence_id,
            start_offset_ms: open.start_offset_ms,
            end_offset_ms,
            text: cue_text(outcome, description),
        });
        Ok(true)
    }

    /// Sealed cues so far
    pub fn cues(&self) -> &[SubtitleCue] {
        &self.cues
    }

    /// Render the sealed cues as SRT. An unsealed trailing cue is left out.
    pub fn render(&self) -> String {
        if let Some(open) = self.open {
            tracing::warn!(
                "Dropping caption cue {} that was never closed",
                open.sequence_id
            );
        }
        render_srt(&self.cues)
    }

    fn offset_now(&self, event: &'static str) -> ReporterResult<u64> {
        let origin = self
            .origin_ms
            .ok_or_else(|| ReporterError::state_violation(event, "run has not started"))?;
        Ok(self.clock.now_ms().saturating_sub(origin))
    }
}

/// Status tag followed by the case description. Blank lines would end the
/// SRT block early, so they are dropped.
fn cue_text(outcome: CaseOutcome, description: &str) -> String {
    let description = description
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let tag = match outcome {
        CaseOutcome::Passed => Some(r#"<font color="green">SUCCESS</font>"#),
        CaseOutcome::Failed => Some(r#"<font color="red">FAILED</font>"#),
        CaseOutcome::Pending => Some(r#"<font color="yellow">PENDING</font>"#),
        CaseOutcome::Disabled => None,
    };
    match tag {
        Some(tag) => format!("{} {}", tag, description),
        None => description,
    }
}
