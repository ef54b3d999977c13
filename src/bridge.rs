//! JSON-lines lifecycle bridge
//!
//! Feeds newline-delimited [`LifecycleEvent`]s to a controller. Kept-artifact
//! notices go to `notices`; the first error is written to `errors` as an
//! [`ErrorResponse`] line and ends the run.

use crate::lifecycle::LifecycleEvent;
use crate::recorder::{Artifact, RecordingSessionController};
use crate::utils::error::{ErrorResponse, ReporterError};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// How a bridged run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// Input ended without errors
    Completed,
    /// An event failed; its error response was written
    Failed,
}

/// Run events from `input` until EOF or the first error.
///
/// A capture still live when the input stops is stopped before returning,
/// with its file kept.
pub async fn run_events<R, O, E>(
    controller: &mut RecordingSessionController,
    input: R,
    notices: &mut O,
    errors: &mut E,
) -> io::Result<BridgeOutcome>
where
    R: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<LifecycleEvent>(line) {
            Ok(event) => {
                tracing::debug!("Received {}", event.name());
                controller.handle(event).await
            }
            Err(e) => Err(ReporterError::InvalidEvent(e.to_string())),
        };

        match result {
            Ok(Some(artifact)) => report(&artifact, notices).await?,
            Ok(None) => {}
            Err(error) => {
                write_line(errors, &serde_json::to_string(&ErrorResponse::from(&error))?).await?;
                if let Err(e) = controller.shutdown().await {
                    tracing::warn!("Failed to stop capture after error: {}", e);
                }
                return Ok(BridgeOutcome::Failed);
            }
        }
    }

    match controller.shutdown().await {
        Ok(Some(path)) => {
            tracing::warn!("Input ended mid-recording, kept {}", path.display());
            Ok(BridgeOutcome::Completed)
        }
        Ok(None) => Ok(BridgeOutcome::Completed),
        Err(error) => {
            write_line(errors, &serde_json::to_string(&ErrorResponse::from(&error))?).await?;
            Ok(BridgeOutcome::Failed)
        }
    }
}

/// Write a notice for every file left on disk
async fn report<O>(artifact: &Artifact, notices: &mut O) -> io::Result<()>
where
    O: AsyncWrite + Unpin,
{
    let kept = match artifact {
        Artifact::Case(recording) => recording.retained,
        Artifact::Run(_) => true,
    };
    if kept {
        write_line(notices, &serde_json::to_string(artifact)?).await?;
    }
    Ok(())
}

async fn write_line<W>(out: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
