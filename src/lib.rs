//! Pin Authorizer Library
//!
//! Grants access only when a live server presents exactly the certificate
//! chain (leaf, intermediate, root) pinned for it.
//!
//! # Features
//!
//! - **Exact chain pinning**: whitespace-insensitive, position-by-position comparison
//! - **Verified retrieval**: rustls handshake with hostname and trust-store validation
//! - **Fail-closed**: any configuration, network or TLS failure yields `Deny`
//! - **Injectable collaborators**: [`source::PinSource`] and [`chain::ChainRetriever`]
//! - **Authorizer surface**: policy-document responses over HTTP or the CLI
//!
//! The pure decision core lives in the `pin-core` crate and is re-exported
//! here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authorizer;
pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod secrets;
pub mod server;
pub mod source;

pub use error::{Error, Result};
pub use pin_core::{
    CertRole, ComparisonResult, ConfigError, Decision, PinRecord, PinSet, RetrievedChain,
    compare, decide, extract, strip_whitespace,
};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` takes precedence over `level`.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    installed.map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
