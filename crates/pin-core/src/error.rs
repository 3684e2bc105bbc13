//! Error types for pinned configuration

use thiserror::Error;

/// Pinned configuration is missing, incomplete, or malformed.
///
/// The surrounding shell maps every variant to a denial; none of them is
/// fatal to the calling process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field is absent or empty after normalization
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Port is not in `1..=65535`
    #[error("Invalid port: {0} (expected 1-65535)")]
    InvalidPort(i64),

    /// Record could not be decoded at all
    #[error("Malformed pinned record: {0}")]
    Malformed(String),
}
