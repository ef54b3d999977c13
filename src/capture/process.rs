//! Capture process management on tokio
//!
//! The child is owned by a watcher task that waits for either natural exit
//! or a termination request. Output streams are drained by their own tasks
//! so a chatty capture tool can never block on a full pipe.
//!
//! Children are not killed when the runtime goes away: a process that was
//! sent SIGTERM gets to finish writing its file even if the reporter exits
//! first.

use super::traits::{CaptureProcess, DiagnosticSink, ProcessLauncher, StreamKind};
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};

/// Acknowledges delivery of a termination signal
type TerminateAck = oneshot::Sender<io::Result<()>>;

/// Launches capture processes with `tokio::process`.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    fn spawn(
        &self,
        command: &str,
        args: &[String],
        sink: Arc<dyn DiagnosticSink>,
    ) -> io::Result<Box<dyn CaptureProcess>> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()?;

        let pid = child.id();
        tracing::debug!("Spawned {} (pid {:?})", command, pid);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, StreamKind::Stdout, sink.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, StreamKind::Stderr, sink.clone()));
        }

        let (terminate_tx, terminate_rx) = oneshot::channel();
        let (exited_tx, exited_rx) = watch::channel(false);
        tokio::spawn(watch_child(child, terminate_rx, exited_tx, sink));

        Ok(Box::new(TokioCaptureProcess {
            pid,
            terminate_tx: Some(terminate_tx),
            exited_rx,
        }))
    }
}

/// A capture process spawned by [`TokioLauncher`].
///
/// Dropping the handle without terminating still terminates the process,
/// as long as the runtime is alive to run the watcher.
pub struct TokioCaptureProcess {
    pid: Option<u32>,
    terminate_tx: Option<oneshot::Sender<TerminateAck>>,
    exited_rx: watch::Receiver<bool>,
}

#[async_trait]
impl CaptureProcess for TokioCaptureProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    async fn terminate(&mut self) -> io::Result<()> {
        let terminate_tx = self.terminate_tx.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "termination already requested")
        })?;

        let (ack_tx, ack_rx) = oneshot::channel();
        if terminate_tx.send(ack_tx).is_err() {
            tracing::debug!("Capture process {:?} already exited", self.pid);
            return Ok(());
        }

        match ack_rx.await {
            Ok(delivered) => delivered,
            // Watcher saw the exit first and dropped the request
            Err(_) => Ok(()),
        }
    }

    async fn wait_for_exit(&mut self, timeout: Duration) -> bool {
        let exited = *self.exited_rx.borrow();
        if exited {
            return true;
        }
        match tokio::time::timeout(timeout, self.exited_rx.wait_for(|exited| *exited)).await {
            Ok(result) => result.is_ok(),
            Err(_) => false,
        }
    }
}

enum Wake {
    Exited(io::Result<std::process::ExitStatus>),
    Terminate(Option<TerminateAck>),
}

async fn watch_child(
    mut child: Child,
    terminate_rx: oneshot::Receiver<TerminateAck>,
    exited_tx: watch::Sender<bool>,
    sink: Arc<dyn DiagnosticSink>,
) {
    let wake = tokio::select! {
        status = child.wait() => Wake::Exited(status),
        request = terminate_rx => Wake::Terminate(request.ok()),
    };

    let status = match wake {
        Wake::Exited(status) => status,
        Wake::Terminate(ack) => {
            let delivered = send_termination(&mut child);
            if delivered.is_err() {
                let _ = child.start_kill();
            }
            match ack {
                Some(ack) => {
                    let _ = ack.send(delivered);
                }
                None => {
                    // Handle dropped without an explicit stop
                    if let Err(e) = delivered {
                        tracing::warn!("Failed to terminate orphaned capture process: {}", e);
                    }
                }
            }
            child.wait().await
        }
    };

    match status {
        Ok(status) => sink.exited(status.code()),
        Err(e) => tracing::warn!("Failed to wait for capture process: {}", e),
    }
    let _ = exited_tx.send(true);
}

/// Ask the process to stop so the capture tool can finalize its output
#[cfg(unix)]
fn send_termination(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        // Already reaped
        return Ok(());
    };
    let pid: libc::pid_t = pid
        .try_into()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "PID out of range"))?;

    let result = unsafe { libc::kill(pid, libc::SIGTERM) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn send_termination(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

async fn forward_lines<R>(reader: R, stream: StreamKind, sink: Arc<dyn DiagnosticSink>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                sink.output(stream, line.trim_end());
            }
            Err(e) => {
                tracing::debug!("Stopped reading capture {} stream: {}", stream, e);
                break;
            }
        }
    }
}

/// Forwards diagnostics to the `tracing` log at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn output(&self, stream: StreamKind, line: &str) {
        tracing::debug!("capture ({}): {}", stream, line);
    }

    fn exited(&self, code: Option<i32>) {
        tracing::debug!("Capture process exited with code {:?}", code);
    }
}

/// Discards diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn output(&self, _stream: StreamKind, _line: &str) {}

    fn exited(&self, _code: Option<i32>) {}
}
