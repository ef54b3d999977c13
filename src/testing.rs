//! In-memory collaborators for unit tests

use crate::capture::{CaptureProcess, Clock, DiagnosticSink, FileSystem, ProcessLauncher, StreamKind};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Clock that only moves when told to
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Sink that remembers everything it was told
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(StreamKind, String)>>,
    exits: Mutex<Vec<Option<i32>>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<(StreamKind, String)> {
        self.lines.lock().clone()
    }

    pub fn exits(&self) -> Vec<Option<i32>> {
        self.exits.lock().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn output(&self, stream: StreamKind, line: &str) {
        self.lines.lock().push((stream, line.to_string()));
    }

    fn exited(&self, code: Option<i32>) {
        self.exits.lock().push(code);
    }
}

/// Filesystem kept in a map
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
    directories: Mutex<HashSet<PathBuf>>,
    modes: Mutex<HashMap<PathBuf, u32>>,
    fail_writes: AtomicBool,
}

impl MemoryFileSystem {
    pub fn insert(&self, path: &Path, content: &str) {
        self.files.lock().insert(path.to_path_buf(), content.to_string());
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    pub fn mode(&self, path: &Path) -> Option<u32> {
        self.modes.lock().get(path).copied()
    }

    pub fn has_directory(&self, path: &Path) -> bool {
        self.directories.lock().contains(path)
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

impl FileSystem for MemoryFileSystem {
    fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        self.directories.lock().insert(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        match self.files.lock().remove(path) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }

    fn write_text(&self, path: &Path, content: &str) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.insert(path, content);
        Ok(())
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()> {
        if !self.exists(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        }
        self.modes.lock().insert(path.to_path_buf(), mode);
        Ok(())
    }
}

/// What the fake launcher observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCall {
    Start { command: String, args: Vec<String> },
    Stop { pid: u32 },
}

/// Launcher whose "capture" writes the output path (the last argument)
/// into a [`MemoryFileSystem`]
pub struct FakeLauncher {
    fs: Arc<MemoryFileSystem>,
    calls: Arc<Mutex<Vec<LaunchCall>>>,
    next_pid: AtomicU32,
    fail_spawn: AtomicBool,
    fail_terminate: Arc<AtomicBool>,
}

impl FakeLauncher {
    pub fn new(fs: Arc<MemoryFileSystem>) -> Self {
        Self {
            fs,
            calls: Arc::new(Mutex::new(Vec::new())),
            next_pid: AtomicU32::new(1000),
            fail_spawn: AtomicBool::new(false),
            fail_terminate: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn calls(&self) -> Vec<LaunchCall> {
        self.calls.lock().clone()
    }

    pub fn starts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, LaunchCall::Start { .. }))
            .count()
    }

    pub fn stops(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, LaunchCall::Stop { .. }))
            .count()
    }

    pub fn fail_spawn(&self) {
        self.fail_spawn.store(true, Ordering::SeqCst);
    }

    pub fn fail_terminate(&self) {
        self.fail_terminate.store(true, Ordering::SeqCst);
    }
}

impl ProcessLauncher for FakeLauncher {
    fn spawn(
        &self,
        command: &str,
        args: &[String],
        _sink: Arc<dyn DiagnosticSink>,
    ) -> io::Result<Box<dyn CaptureProcess>> {
        if self.fail_spawn.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such executable"));
        }
        if let Some(output) = args.last() {
            self.fs.insert(Path::new(output), "video");
        }
        self.calls.lock().push(LaunchCall::Start {
            command: command.to_string(),
            args: args.to_vec(),
        });
        Ok(Box::new(FakeProcess {
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            calls: self.calls.clone(),
            fail_terminate: self.fail_terminate.clone(),
            terminated: false,
        }))
    }
}

struct FakeProcess {
    pid: u32,
    calls: Arc<Mutex<Vec<LaunchCall>>>,
    fail_terminate: Arc<AtomicBool>,
    terminated: bool,
}

#[async_trait]
impl CaptureProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    async fn terminate(&mut self) -> io::Result<()> {
        if self.terminated {
            return Err(io::Error::new(io::ErrorKind::Other, "termination already requested"));
        }
        self.terminated = true;
        self.calls.lock().push(LaunchCall::Stop { pid: self.pid });
        if self.fail_terminate.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "EPERM"));
        }
        Ok(())
    }

    async fn wait_for_exit(&mut self, _timeout: Duration) -> bool {
        self.terminated
    }
}
