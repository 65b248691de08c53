//! # Settings Check Error Types
//!
//! Errors from setup paths: loading configuration and replay scenarios.
//!
//! The check itself never fails. A dropped fragment is a degraded outcome,
//! not an error, so the hot path has no `Result` at all.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while setting up the settings check.
#[derive(Error, Debug)]
pub enum SecurityError {
    /// Configuration values are out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A TOML document could not be parsed.
    #[error("malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for settings check setup.
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Reads a file to a string, attaching the path to any failure.
pub(crate) fn read_file(path: &std::path::Path) -> SecurityResult<String> {
    std::fs::read_to_string(path).map_err(|source| SecurityError::Io {
        path: path.to_path_buf(),
        source,
    })
}
