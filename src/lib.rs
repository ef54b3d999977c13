//! Screencast Reporter - screen recordings of automated test runs.
//!
//! Records the display while tests execute, either one video per case or a
//! single video for the whole run with a caption track marking each case.

pub mod bridge;
pub mod captions;
pub mod capture;
pub mod config;
pub mod lifecycle;
pub mod policy;
pub mod recorder;
pub mod utils;

#[cfg(test)]
mod testing;

pub use bridge::{run_events, BridgeOutcome};
pub use config::{ReporterConfig, ReporterOptions};
pub use lifecycle::{CaseOutcome, CaseResult, LifecycleEvent};
pub use recorder::{Artifact, RecordingSessionController, RecordingState};
pub use utils::{ErrorResponse, ReporterError, ReporterResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr.
///
/// `RUST_LOG` wins over `debug`. Calling this twice is harmless.
pub fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "screencast_reporter=debug"
    } else {
        "screencast_reporter=info"
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
