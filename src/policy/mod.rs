//! Recording policies
//!
//! Pure decisions the recorder consults: where a recording goes and whether
//! it survives its case.

pub mod naming;
pub mod retention;

pub use naming::{caption_path, resolve_path, run_recording_path, sanitize_case_name};
pub use retention::{decide, RetentionDecision};
