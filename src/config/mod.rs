//! Reporter configuration
//!
//! [`ReporterOptions`] is what the host hands us; [`ReporterConfig`] is the
//! validated, immutable form the recorder works against.

pub mod options;

pub use options::{
    default_capture_args, CaptureArg, CustomNamer, Granularity, NamerError, NamingModeSetting,
    ReporterOptions,
};

use crate::utils::error::{ReporterError, ReporterResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How per-case recordings are named
#[derive(Debug, Clone)]
pub enum NamingMode {
    RandomId,
    SanitizedCaseName,
    Custom(CustomNamer),
}

/// Permission change applied to kept artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCapturePermission {
    None,
    /// Unix mode bits, e.g. `0o644`
    Mode(u32),
}

impl PostCapturePermission {
    /// Parse `"none"` or an octal mode (`"644"`, `"0644"`, `"0o644"`)
    pub fn parse(value: &str) -> ReporterResult<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }

        let digits = value.strip_prefix("0o").unwrap_or(value);
        let mode = u32::from_str_radix(digits, 8).map_err(|_| {
            ReporterError::Configuration(format!("Invalid postCapturePermission: {:?}", value))
        })?;
        if mode > 0o7777 {
            return Err(ReporterError::Configuration(format!(
                "postCapturePermission out of range: {:?}",
                value
            )));
        }
        Ok(Self::Mode(mode))
    }
}

/// Validated reporter configuration. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    base_directory: Option<PathBuf>,
    granularity: Granularity,
    save_successful_cases: bool,
    naming_mode: NamingMode,
    build_captions: bool,
    post_capture_permission: PostCapturePermission,
    capture_command: String,
    capture_args: Vec<String>,
    debug: bool,
    stop_timeout: Option<Duration>,
}

impl ReporterConfig {
    /// Validate raw options
    pub fn from_options(options: ReporterOptions) -> ReporterResult<Self> {
        let capture_command = options.capture_command.trim().to_string();
        if capture_command.is_empty() {
            return Err(ReporterError::Configuration(
                "captureCommand must not be empty".to_string(),
            ));
        }

        let naming_mode = match (options.naming_mode, options.custom_namer) {
            (NamingModeSetting::RandomId, _) => NamingMode::RandomId,
            (NamingModeSetting::SanitizedCaseName, _) => NamingMode::SanitizedCaseName,
            (NamingModeSetting::Custom, Some(namer)) => NamingMode::Custom(namer),
            (NamingModeSetting::Custom, None) => {
                return Err(ReporterError::Configuration(
                    "namingMode \"custom\" requires a naming function".to_string(),
                ))
            }
        };

        let post_capture_permission = PostCapturePermission::parse(&options.post_capture_permission)?;

        match options.granularity {
            Granularity::PerCase if options.build_captions => {
                tracing::warn!("buildCaptions has no effect with per-case recordings");
            }
            Granularity::WholeRun if options.save_successful_cases => {
                tracing::warn!("saveSuccessfulCases has no effect with whole-run recordings");
            }
            _ => {}
        }

        Ok(Self {
            base_directory: options.base_directory,
            granularity: options.granularity,
            save_successful_cases: options.save_successful_cases,
            naming_mode,
            build_captions: options.build_captions,
            post_capture_permission,
            capture_command,
            capture_args: options.capture_args.iter().map(|arg| arg.to_string()).collect(),
            debug: options.debug,
            stop_timeout: options.stop_timeout_ms.map(Duration::from_millis),
        })
    }

    /// Base directory for recordings. Only required once a path is resolved.
    pub fn base_directory(&self) -> ReporterResult<&Path> {
        self.base_directory.as_deref().ok_or_else(|| {
            ReporterError::Configuration("baseDirectory is required to record".to_string())
        })
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn save_successful_cases(&self) -> bool {
        self.save_successful_cases
    }

    pub fn naming_mode(&self) -> &NamingMode {
        &self.naming_mode
    }

    /// Captions are only built for whole-run recordings
    pub fn captions_enabled(&self) -> bool {
        self.granularity == Granularity::WholeRun && self.build_captions
    }

    pub fn post_capture_permission(&self) -> PostCapturePermission {
        self.post_capture_permission
    }

    pub fn capture_command(&self) -> &str {
        &self.capture_command
    }

    pub fn capture_args(&self) -> &[String] {
        &self.capture_args
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn stop_timeout(&self) -> Option<Duration> {
        self.stop_timeout
    }
}

impl TryFrom<ReporterOptions> for ReporterConfig {
    type Error = ReporterError;

    fn try_from(options: ReporterOptions) -> ReporterResult<Self> {
        Self::from_options(options)
    }
}
