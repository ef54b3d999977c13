//! Recording state management
//!
//! Defines the recording state machine and the live session value that is
//! handed from `start` to `stop`.

use crate::capture::CaptureProcess;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Current state of the recording system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No capture process is running
    #[default]
    Idle,
    /// A capture process is writing to the session's video path
    Recording,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => f.write_str("idle"),
            RecordingState::Recording => f.write_str("recording"),
        }
    }
}

/// A live recording: exactly one capture process writing one file.
///
/// Owned by whoever started it and consumed by `stop`, so it can never
/// outlive its own stop call.
pub struct RecordingSession {
    video_path: PathBuf,
    started_at: DateTime<Utc>,
    process: Box<dyn CaptureProcess>,
}

impl RecordingSession {
    pub(crate) fn new(video_path: PathBuf, process: Box<dyn CaptureProcess>) -> Self {
        Self {
            video_path,
            started_at: Utc::now(),
            process,
        }
    }

    /// Where the capture process is writing
    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// Wall-clock time the capture was launched
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// OS process id of the capture tool, if known
    pub fn process_id(&self) -> Option<u32> {
        self.process.id()
    }

    pub(crate) fn into_parts(self) -> (PathBuf, DateTime<Utc>, Box<dyn CaptureProcess>) {
        (self.video_path, self.started_at, self.process)
    }
}

impl fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSession")
            .field("video_path", &self.video_path)
            .field("started_at", &self.started_at)
            .field("pid", &self.process.id())
            .finish()
    }
}

/// A session after its capture process was told to stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppedRecording {
    pub video_path: PathBuf,
    /// Wall-clock time between launch and stop
    pub duration_ms: i64,
}
