//! Pinned record sources.
//!
//! A [`PinSource`] is the configuration provider injected into the
//! authorizer. It is consulted once per invocation and either yields a
//! validated [`PinSet`] or an error; the authorizer never proceeds to
//! retrieval without one.

use async_trait::async_trait;
use tracing::debug;

use pin_core::{CertRole, ConfigError, PinRecord, PinSet, RetrievedChain};

use crate::{Error, Result};
use crate::config::PinsConfig;
use crate::secrets::SecretResolver;

/// Provider of the pinned chain.
#[async_trait]
pub trait PinSource: Send + Sync {
    /// Load and validate the pinned chain for this invocation.
    async fn load(&self) -> Result<PinSet>;
}

/// Decode the JSON wire form of a pinned record into a [`PinSet`].
///
/// # Errors
///
/// Returns [`ConfigError::Malformed`] for undecodable JSON (including a
/// non-integer port) and the field-level errors of [`PinSet::try_from`].
pub fn parse_pin_record(json: &str) -> std::result::Result<PinSet, ConfigError> {
    let record: PinRecord =
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
    PinSet::try_from(record)
}

/// Build the pinned record for `host:port` from a live chain, as
/// pretty-printed JSON ready to store behind a secret reference.
///
/// # Errors
///
/// Returns [`Error::Pins`] if the chain has fewer than three certificates.
pub fn pin_record_json(host: &str, port: u16, chain: &RetrievedChain) -> Result<String> {
    let entry = |role: CertRole| chain.entries().get(role.position()).map_or("", String::as_str);
    let pins = PinSet::new(
        host,
        i64::from(port),
        entry(CertRole::Server),
        entry(CertRole::Intermediate),
        entry(CertRole::Root),
    )?;
    Ok(serde_json::to_string_pretty(&pins.to_record())?)
}

/// [`PinSource`] reading the record through a [`SecretResolver`] reference.
#[derive(Debug, Clone)]
pub struct SecretPinSource {
    reference: String,
    resolver: SecretResolver,
}

impl SecretPinSource {
    /// Create a source for `reference` (see [`SecretResolver::resolve`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the resolver cannot be built.
    pub fn new(reference: impl Into<String>) -> Result<Self> {
        Ok(Self {
            reference: reference.into(),
            resolver: SecretResolver::new()?,
        })
    }

    /// Create a source from the `pins` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolver cannot be built.
    pub fn from_config(config: &PinsConfig) -> Result<Self> {
        Self::new(config.secret.clone())
    }
}

#[async_trait]
impl PinSource for SecretPinSource {
    async fn load(&self) -> Result<PinSet> {
        // File reads and keychain subprocesses block; keep them off the workers
        let resolver = self.resolver.clone();
        let reference = self.reference.clone();
        let raw = tokio::task::spawn_blocking(move || resolver.resolve(&reference))
            .await
            .map_err(|e| Error::Internal(format!("Secret resolution task failed: {e}")))??;
        let pins = parse_pin_record(&raw)?;
        debug!(target_host = %pins.host(), port = pins.port(), "Pinned chain loaded");
        Ok(pins)
    }
}
