//! Capture collaborators
//!
//! Traits the recorder depends on, with the production implementations:
//! tokio-driven capture processes, the local filesystem and a monotonic clock.

pub mod fs;
pub mod process;
pub mod traits;

pub use fs::LocalFileSystem;
pub use process::{NullSink, TokioCaptureProcess, TokioLauncher, TracingSink};
pub use traits::{
    CaptureProcess, Clock, DiagnosticSink, FileSystem, MonotonicClock, ProcessLauncher, StreamKind,
};
