//! Raw reporter options
//!
//! These are deserialized from the host's JSON configuration and carry the
//! same defaults the reporter has always shipped with. They are validated
//! once into a [`ReporterConfig`](super::ReporterConfig).

use crate::lifecycle::CaseResult;
use crate::utils::error::{ReporterError, ReporterResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Error type returned by a custom naming function
pub type NamerError = Box<dyn std::error::Error + Send + Sync>;

type NamerFn = dyn Fn(&CaseResult) -> Result<String, NamerError> + Send + Sync;

/// Caller-supplied naming function. The returned string is joined onto the
/// base directory verbatim; keeping it inside that directory is the caller's job.
#[derive(Clone)]
pub struct CustomNamer(Arc<NamerFn>);

impl CustomNamer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CaseResult) -> Result<String, NamerError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, result: &CaseResult) -> Result<String, NamerError> {
        (self.0)(result)
    }
}

impl fmt::Debug for CustomNamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomNamer(..)")
    }
}

/// Whether one recording spans the whole run or one exists per case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Granularity {
    PerCase,
    WholeRun,
}

/// Naming mode as it appears in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamingModeSetting {
    RandomId,
    SanitizedCaseName,
    /// Requires a function registered with [`ReporterOptions::with_custom_naming`]
    Custom,
}

/// A single capture argument token; numbers are accepted for convenience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptureArg {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for CaptureArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureArg::Text(text) => f.write_str(text),
            CaptureArg::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for CaptureArg {
    fn from(value: &str) -> Self {
        CaptureArg::Text(value.to_string())
    }
}

impl From<u64> for CaptureArg {
    fn from(value: u64) -> Self {
        CaptureArg::Number(value.into())
    }
}

/// Reporter options as supplied by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ReporterOptions {
    /// Directory videos are stored in. Created on demand.
    pub base_directory: Option<PathBuf>,

    /// Recording granularity
    pub granularity: Granularity,

    /// Keep videos of passing cases too (per-case only)
    pub save_successful_cases: bool,

    /// How per-case videos are named (per-case only)
    pub naming_mode: NamingModeSetting,

    /// Write an SRT caption track next to the run video (whole-run only)
    pub build_captions: bool,

    /// `"none"` or an octal mode such as `"0644"` applied to kept files
    pub post_capture_permission: String,

    /// Capture executable, e.g. `/usr/bin/ffmpeg`
    pub capture_command: String,

    /// Capture arguments, not including the output path which is appended
    pub capture_args: Vec<CaptureArg>,

    /// Forward capture-process output and exit status to the log
    pub debug: bool,

    /// Wait up to this long for the capture process to exit after stopping
    pub stop_timeout_ms: Option<u64>,

    #[serde(skip)]
    pub custom_namer: Option<CustomNamer>,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            base_directory: None,
            granularity: Granularity::WholeRun,
            save_successful_cases: false,
            naming_mode: NamingModeSetting::SanitizedCaseName,
            build_captions: true,
            post_capture_permission: "none".to_string(),
            capture_command: "ffmpeg".to_string(),
            capture_args: default_capture_args(),
            debug: false,
            stop_timeout_ms: None,
            custom_namer: None,
        }
    }
}

impl ReporterOptions {
    /// Parse options from a JSON document
    pub fn from_json_str(json: &str) -> ReporterResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ReporterError::Configuration(format!("Invalid options: {}", e)))
    }

    /// Read and parse options from a JSON file
    pub fn from_file(path: &Path) -> ReporterResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReporterError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Register a custom naming function and select the custom naming mode
    pub fn with_custom_naming<F>(mut self, f: F) -> Self
    where
        F: Fn(&CaseResult) -> Result<String, NamerError> + Send + Sync + 'static,
    {
        self.naming_mode = NamingModeSetting::Custom;
        self.custom_namer = Some(CustomNamer::new(f));
        self
    }
}

/// Default x11grab arguments for the screen the tests run on.
///
/// The capture source comes from `DISPLAY`, resolved here rather than in the
/// recording core.
pub fn default_capture_args() -> Vec<CaptureArg> {
    let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
    vec![
        "-y".into(),
        "-r".into(),
        30u64.into(),
        "-f".into(),
        "x11grab".into(),
        "-s".into(),
        "1024x768".into(),
        "-i".into(),
        CaptureArg::Text(display),
        "-g".into(),
        300u64.into(),
        "-vcodec".into(),
        "qtrle".into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::CaseOutcome;

    #[test]
    fn test_defaults_from_empty_object() {
        let options = ReporterOptions::from_json_str("{}").unwrap();

        assert_eq!(options.granularity, Granularity::WholeRun);
        assert!(!options.save_successful_cases);
        assert!(options.build_captions);
        assert_eq!(options.capture_command, "ffmpeg");
        assert_eq!(options.post_capture_permission, "none");
        assert!(options.base_directory.is_none());
        assert_eq!(options.capture_args.len(), 13);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = ReporterOptions::from_json_str(r#"{"singleVideo": true}"#).unwrap_err();
        assert!(matches!(err, ReporterError::Configuration(_)));
    }

    #[test]
    fn test_mixed_capture_args() {
        let options = ReporterOptions::from_json_str(
            r#"{"granularity":"perCase","captureArgs":["-r",25,"-f","x11grab"]}"#,
        )
        .unwrap();

        let rendered: Vec<String> = options.capture_args.iter().map(|a| a.to_string()).collect();
        assert_eq!(rendered, vec!["-r", "25", "-f", "x11grab"]);
        assert_eq!(options.granularity, Granularity::PerCase);
    }

    #[test]
    fn test_custom_naming_selects_mode() {
        let options = ReporterOptions::default().with_custom_naming(|result| {
            Ok(format!("{}.mov", result.description))
        });

        assert_eq!(options.naming_mode, NamingModeSetting::Custom);
        let namer = options.custom_namer.unwrap();
        let name = namer
            .call(&CaseResult::new("suite case", "case", CaseOutcome::Passed))
            .unwrap();
        assert_eq!(name, "case.mov");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporter.json");
        std::fs::write(&path, r#"{"baseDirectory":"/tmp/videos","debug":true}"#).unwrap();

        let options = ReporterOptions::from_file(&path).unwrap();
        assert_eq!(options.base_directory, Some(PathBuf::from("/tmp/videos")));
        assert!(options.debug);

        let missing = ReporterOptions::from_file(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ReporterError::Configuration(_))));
    }
}
