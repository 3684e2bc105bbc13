//! Error types for the pin authorizer

use std::io;

use thiserror::Error;

use pin_core::ConfigError;

/// Result type alias for the pin authorizer
pub type Result<T> = std::result::Result<T, Error>;

/// Pin authorizer errors
///
/// None of these ever reaches an authorization caller: the pipeline maps
/// each one to a denial and keeps the detail for operator logs.
#[derive(Error, Debug)]
pub enum Error {
    /// Service configuration error (config file, trust store, listener)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pinned record missing, incomplete, or malformed
    #[error("Pinned configuration error: {0}")]
    Pins(#[from] ConfigError),

    /// Secret reference could not be resolved
    #[error("Secret error: {0}")]
    Secret(String),

    /// TLS-layer error
    #[error("TLS error: {0}")]
    Tls(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// `true` when the error means the pinned configuration itself is unusable.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Pins(_) | Self::Secret(_) | Self::Config(_))
    }
}

impl From<rustls::Error> for Error {
    fn from(e: rustls::Error) -> Self {
        Self::Tls(e.to_string())
    }
}
