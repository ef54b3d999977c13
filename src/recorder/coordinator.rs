//! Recording session controller
//!
//! Drives capture, retention and captions from the test-run lifecycle.
//! Events must arrive serially; anything delivered out of order is a
//! [`ReporterError::StateViolation`] rather than a silent overwrite.

use super::state::{RecordingSession, RecordingState};
use super::supervisor::ProcessSupervisor;
use crate::captions::CaptionTimelineBuilder;
use crate::capture::{
    Clock, DiagnosticSink, FileSystem, LocalFileSystem, MonotonicClock, NullSink, ProcessLauncher,
    TokioLauncher, TracingSink,
};
use crate::config::{Granularity, PostCapturePermission, ReporterConfig};
use crate::lifecycle::{CaseResult, LifecycleEvent};
use crate::policy::{naming, retention, RetentionDecision};
use crate::utils::error::{ReporterError, ReporterResult};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happened to a per-case recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecording {
    pub path: PathBuf,
    pub decision: RetentionDecision,
    /// Whether the file is still on disk
    pub retained: bool,
}

/// Files kept at the end of a whole-run recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunArtifacts {
    pub video: PathBuf,
    pub captions: Option<PathBuf>,
}

/// Output of a handled lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Artifact {
    Case(CaseRecording),
    Run(RunArtifacts),
}

/// One controller per test run
pub struct RecordingSessionController {
    config: ReporterConfig,
    supervisor: ProcessSupervisor,
    fs: Arc<dyn FileSystem>,
    captions: Option<CaptionTimelineBuilder>,
    session: Option<RecordingSession>,
}

impl RecordingSessionController {
    /// Create a controller over explicit collaborators
    pub fn new(
        config: ReporterConfig,
        launcher: Arc<dyn ProcessLauncher>,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sink: Arc<dyn DiagnosticSink> = if config.debug() {
            Arc::new(TracingSink)
        } else {
            Arc::new(NullSink)
        };
        let supervisor = ProcessSupervisor::new(&config, launcher, fs.clone(), sink);
        let captions = config
            .captions_enabled()
            .then(|| CaptionTimelineBuilder::new(clock));

        Self {
            config,
            supervisor,
            fs,
            captions,
            session: None,
        }
    }

    /// Controller that spawns real processes and writes to the local disk
    pub fn with_defaults(config: ReporterConfig) -> Self {
        Self::new(
            config,
            Arc::new(TokioLauncher),
            Arc::new(LocalFileSystem),
            Arc::new(MonotonicClock::new()),
        )
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub fn state(&self) -> RecordingState {
        if self.session.is_some() {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    /// Dispatch a lifecycle event
    pub async fn handle(&mut self, event: LifecycleEvent) -> ReporterResult<Option<Artifact>> {
        match event {
            LifecycleEvent::RunStarted => {
                self.run_started()?;
                Ok(None)
            }
            LifecycleEvent::CaseStarted { result } => {
                self.case_started(&result)?;
                Ok(None)
            }
            LifecycleEvent::CaseDone { result } => {
                Ok(self.case_done(&result).await?.map(Artifact::Case))
            }
            LifecycleEvent::RunDone => Ok(self.run_done().await?.map(Artifact::Run)),
        }
    }

    pub fn run_started(&mut self) -> ReporterResult<()> {
        self.ensure_idle("runStarted")?;
        if self.config.granularity() == Granularity::PerCase {
            return Ok(());
        }

        let path = naming::run_recording_path(&self.config)?;
        self.session = Some(self.supervisor.start(&path)?);
        if let Some(captions) = self.captions.as_mut() {
            captions.on_run_start();
        }
        Ok(())
    }

    pub fn case_started(&mut self, result: &CaseResult) -> ReporterResult<()> {
        match self.config.granularity() {
            Granularity::PerCase => {
                self.ensure_idle("caseStarted")?;
                let path = naming::resolve_path(self.config.naming_mode(), result, &self.config)?;
                self.session = Some(self.supervisor.start(&path)?);
                Ok(())
            }
            Granularity::WholeRun => {
                self.ensure_recording("caseStarted")?;
                match self.captions.as_mut() {
                    Some(captions) => captions.on_case_start(),
                    None => Ok(()),
                }
            }
        }
    }

    /// Finish a case. Per-case recordings are stopped and the retention
    /// decision applied; whole-run recordings only get a caption cue.
    pub async fn case_done(&mut self, result: &CaseResult) -> ReporterResult<Option<CaseRecording>> {
        if self.config.granularity() == Granularity::WholeRun {
            self.ensure_recording("caseDone")?;
            if let Some(captions) = self.captions.as_mut() {
                captions.on_case_end(result.outcome, &result.description)?;
            }
            return Ok(None);
        }

        let decision = retention::decide(result.outcome, &self.config);
        let Some(session) = self.session.take() else {
            if result.outcome.may_skip_start() {
                tracing::debug!("{} case {:?} was never recorded", result.outcome, result.full_name);
                return Ok(None);
            }
            return Err(ReporterError::state_violation("caseDone", RecordingState::Idle));
        };

        let stopped = self.supervisor.stop(session).await?;
        let path = stopped.video_path;
        match decision {
            RetentionDecision::Keep => {
                self.apply_permission(&path)?;
                tracing::info!("Case video is in: {}", path.display());
            }
            RetentionDecision::Discard => {
                if !self.fs.exists(&path) {
                    return Err(ReporterError::ArtifactMissing(path));
                }
                self.remove(&path)?;
            }
            RetentionDecision::DiscardIfPresent => {
                if self.fs.exists(&path) {
                    self.remove(&path)?;
                } else {
                    tracing::debug!("No video to remove at {}", path.display());
                }
            }
        }

        Ok(Some(CaseRecording {
            path,
            decision,
            retained: decision.keeps(),
        }))
    }

    /// Finish the run. Whole-run recordings are stopped, kept and captioned.
    pub async fn run_done(&mut self) -> ReporterResult<Option<RunArtifacts>> {
        if self.config.granularity() == Granularity::PerCase {
            if self.session.is_some() {
                let kept = self.shutdown().await?;
                tracing::warn!("Run ended with a case still recording: {:?}", kept);
                return Err(ReporterError::state_violation("runDone", RecordingState::Recording));
            }
            return Ok(None);
        }

        let session = self
            .session
            .take()
            .ok_or_else(|| ReporterError::state_violation("runDone", RecordingState::Idle))?;
        let video = self.supervisor.stop(session).await?.video_path;
        self.apply_permission(&video)?;
        tracing::info!("Run video is in: {}", video.display());

        let captions = match self.captions.as_ref() {
            Some(captions) => {
                let caption_path = naming::caption_path(&video);
                self.fs
                    .write_text(&caption_path, &captions.render())
                    .map_err(|source| write_failure(&caption_path, source))?;
                self.apply_permission(&caption_path)?;
                tracing::info!("Run captions are in: {}", caption_path.display());
                Some(caption_path)
            }
            None => None,
        };

        Ok(Some(RunArtifacts { video, captions }))
    }

    /// Stop any live capture without a retention decision; the file is kept.
    ///
    /// Used when the host goes away without finishing the run.
    pub async fn shutdown(&mut self) -> ReporterResult<Option<PathBuf>> {
        match self.session.take() {
            Some(session) => {
                let stopped = self.supervisor.stop(session).await?;
                Ok(Some(stopped.video_path))
            }
            None => Ok(None),
        }
    }

    fn ensure_idle(&self, event: &'static str) -> ReporterResult<()> {
        match self.state() {
            RecordingState::Idle => Ok(()),
            state => Err(ReporterError::state_violation(event, state)),
        }
    }

    fn ensure_recording(&self, event: &'static str) -> ReporterResult<()> {
        match self.state() {
            RecordingState::Recording => Ok(()),
            state => Err(ReporterError::state_violation(event, state)),
        }
    }

    fn apply_permission(&self, path: &Path) -> ReporterResult<()> {
        if let PostCapturePermission::Mode(mode) = self.config.post_capture_permission() {
            self.fs
                .set_permissions(path, mode)
                .map_err(|source| write_failure(path, source))?;
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> ReporterResult<()> {
        tracing::debug!("Removing video {}", path.display());
        self.fs.delete(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ReporterError::ArtifactMissing(path.to_path_buf()),
            _ => write_failure(path, source),
        })
    }
}

fn write_failure(path: &Path, source: io::Error) -> ReporterError {
    ReporterError::WriteFailure {
        path: path.to_path_buf(),
        source,
    }
}
