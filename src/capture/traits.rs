//! Capture collaborator traits
//!
//! The recorder only talks to the outside world through these: a launcher
//! for the external capture tool, the local filesystem and a clock.

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which output stream of the capture process a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("out"),
            StreamKind::Stderr => f.write_str("err"),
        }
    }
}

/// Receives capture-process diagnostics.
///
/// Purely observational: recording state never depends on these calls.
pub trait DiagnosticSink: Send + Sync {
    /// One line of process output
    fn output(&self, stream: StreamKind, line: &str);

    /// The process exited; `None` when killed by a signal
    fn exited(&self, code: Option<i32>);
}

/// Starts the external capture tool
pub trait ProcessLauncher: Send + Sync {
    /// Spawn `command args..`. Failure to start is reported synchronously.
    fn spawn(
        &self,
        command: &str,
        args: &[String],
        sink: Arc<dyn DiagnosticSink>,
    ) -> io::Result<Box<dyn CaptureProcess>>;
}

/// Handle to a running capture process
#[async_trait]
pub trait CaptureProcess: Send {
    /// OS process id, if known
    fn id(&self) -> Option<u32>;

    /// Request termination. Resolves once the signal has been delivered,
    /// not when the process has exited.
    async fn terminate(&mut self) -> io::Result<()>;

    /// Wait up to `timeout` for the process to exit; `true` if it did
    async fn wait_for_exit(&mut self, timeout: Duration) -> bool;
}

/// Blocking local filesystem operations
pub trait FileSystem: Send + Sync {
    fn ensure_directory(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn delete(&self, path: &Path) -> io::Result<()>;

    fn write_text(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Apply Unix mode bits
    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()>;
}

/// Monotonic millisecond clock
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
