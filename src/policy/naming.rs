//! Destination paths for recordings

use crate::config::{NamingMode, ReporterConfig};
use crate::lifecycle::CaseResult;
use crate::utils::error::{ReporterError, ReporterResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Container extension used for every recording
pub const VIDEO_EXTENSION: &str = "mov";

/// Caption track extension
pub const CAPTION_EXTENSION: &str = "srt";

/// File stem of the single whole-run recording
pub const RUN_RECORDING_STEM: &str = "test-run";

/// Longest stem a sanitized case name may produce
const MAX_STEM_CHARS: usize = 200;

/// Characters rejected by at least one common filesystem
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Resolve the per-case recording path under the configured base directory
pub fn resolve_path(
    mode: &NamingMode,
    result: &CaseResult,
    config: &ReporterConfig,
) -> ReporterResult<PathBuf> {
    let base = config.base_directory()?;
    let file_name = match mode {
        NamingMode::RandomId => random_file_name(),
        NamingMode::SanitizedCaseName => {
            let stem = sanitize_case_name(&result.full_name);
            if stem.is_empty() {
                tracing::debug!(
                    "Case name {:?} sanitized to nothing, using a random id",
                    result.full_name
                );
                random_file_name()
            } else {
                format!("{}.{}", stem, VIDEO_EXTENSION)
            }
        }
        NamingMode::Custom(namer) => {
            let name = namer.call(result).map_err(|e| {
                ReporterError::LaunchFailure(format!(
                    "naming function failed for {:?}: {}",
                    result.full_name, e
                ))
            })?;
            if name.is_empty() {
                return Err(ReporterError::LaunchFailure(format!(
                    "naming function returned an empty path for {:?}",
                    result.full_name
                )));
            }
            name
        }
    };
    Ok(base.join(file_name))
}

/// Path of the whole-run recording; independent of the naming mode
pub fn run_recording_path(config: &ReporterConfig) -> ReporterResult<PathBuf> {
    let base = config.base_directory()?;
    Ok(base.join(format!("{}.{}", RUN_RECORDING_STEM, VIDEO_EXTENSION)))
}

/// Caption file next to a video: same stem, caption extension
pub fn caption_path(video_path: &Path) -> PathBuf {
    video_path.with_extension(CAPTION_EXTENSION)
}

fn random_file_name() -> String {
    format!("{}.{}", Uuid::new_v4(), VIDEO_EXTENSION)
}

/// Reduce a case name to a single safe path segment.
///
/// Whitespace runs and path separators collapse to `-`, control and
/// filesystem-invalid characters are dropped and the result is lowercased.
/// Leading and trailing dots and dashes are trimmed so the segment can never be `.` or `..`.
/// May return an empty string.
pub fn sanitize_case_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_whitespace() || c == '/' || c == '\\' {
            pending_dash = !out.is_empty();
            continue;
        }
        if c.is_control() || INVALID_CHARS.contains(&c) {
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.extend(c.to_lowercase());
    }

    let is_edge = |c: char| c == '.' || c == '-';
    let trimmed: String = out.trim_matches(is_edge).chars().take(MAX_STEM_CHARS).collect();
    trimmed.trim_end_matches(is_edge).to_string()
}
