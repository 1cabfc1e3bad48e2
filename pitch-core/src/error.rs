//! # Error Module
//!
//! The only fallible operations in the core are configuration loading and
//! pipeline construction. Analysis itself never fails: a frame that cannot
//! be analysed simply produces no estimate.

use thiserror::Error;

/// Errors returned by the pitch-core library.
#[derive(Debug, Error)]
pub enum PitchError {
    /// A configuration value is out of range or inconsistent with another.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file was not valid JSON for `PipelineConfig`.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
