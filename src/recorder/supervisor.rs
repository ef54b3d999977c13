//! Capture process supervision
//!
//! Starts the capture tool for a destination path and stops it again. At
//! most one capture runs per supervisor.

use super::state::{RecordingSession, RecordingState, StoppedRecording};
use crate::capture::{DiagnosticSink, FileSystem, ProcessLauncher};
use crate::config::ReporterConfig;
use crate::utils::error::{ReporterError, ReporterResult};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Owns the launch and termination of capture processes
pub struct ProcessSupervisor {
    launcher: Arc<dyn ProcessLauncher>,
    fs: Arc<dyn FileSystem>,
    sink: Arc<dyn DiagnosticSink>,
    command: String,
    args: Vec<String>,
    stop_timeout: Option<Duration>,
    state: RecordingState,
}

impl ProcessSupervisor {
    pub fn new(
        config: &ReporterConfig,
        launcher: Arc<dyn ProcessLauncher>,
        fs: Arc<dyn FileSystem>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            launcher,
            fs,
            sink,
            command: config.capture_command().to_string(),
            args: config.capture_args().to_vec(),
            stop_timeout: config.stop_timeout(),
            state: RecordingState::Idle,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Launch the capture tool writing to `path`.
    ///
    /// On any failure the supervisor stays idle.
    pub fn start(&mut self, path: &Path) -> ReporterResult<RecordingSession> {
        if self.state != RecordingState::Idle {
            return Err(ReporterError::state_violation("start", self.state));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.ensure_directory(parent).map_err(|e| {
                ReporterError::LaunchFailure(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut args = self.args.clone();
        args.push(path.to_string_lossy().into_owned());
        tracing::debug!("Spawning: {} {}", self.command, args.join(" "));

        let process = self
            .launcher
            .spawn(&self.command, &args, self.sink.clone())
            .map_err(|e| ReporterError::LaunchFailure(format!("{}: {}", self.command, e)))?;

        tracing::debug!(path = %path.display(), pid = ?process.id(), "Saving video");
        self.state = RecordingState::Recording;
        Ok(RecordingSession::new(path.to_path_buf(), process))
    }

    /// Request termination of the session's capture process.
    ///
    /// Returns once the signal is delivered (and, with a stop timeout
    /// configured, once the process exited or the timeout passed). The
    /// supervisor is idle afterwards even if the request failed.
    pub async fn stop(&mut self, session: RecordingSession) -> ReporterResult<StoppedRecording> {
        if self.state != RecordingState::Recording {
            return Err(ReporterError::state_violation("stop", self.state));
        }
        self.state = RecordingState::Idle;

        let (video_path, started_at, mut process) = session.into_parts();
        let pid = process.id();
        process
            .terminate()
            .await
            .map_err(|e| ReporterError::Termination(format!("pid {:?}: {}", pid, e)))?;

        if let Some(timeout) = self.stop_timeout {
            if !process.wait_for_exit(timeout).await {
                tracing::warn!(
                    "Capture process {:?} still running {}ms after stop",
                    pid,
                    timeout.as_millis()
                );
            }
        }

        let duration_ms = (Utc::now() - started_at).num_milliseconds();
        tracing::debug!(path = %video_path.display(), "Recording stopped after {}ms", duration_ms);
        Ok(StoppedRecording {
            video_path,
            duration_ms,
        })
    }
}
