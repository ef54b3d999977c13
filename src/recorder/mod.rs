//! Recording system module
//!
//! Turns lifecycle events into capture sessions:
//! - ProcessSupervisor launches and stops the capture tool
//! - RecordingSessionController applies naming, retention and captions

pub mod coordinator;
pub mod state;
pub mod supervisor;

pub use coordinator::{Artifact, CaseRecording, RecordingSessionController, RunArtifacts};
pub use state::{RecordingSession, RecordingState, StoppedRecording};
pub use supervisor::ProcessSupervisor;
