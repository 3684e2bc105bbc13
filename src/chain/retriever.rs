//! Live certificate chain retrieval over TLS.
//!
//! [`TlsChainRetriever`] opens one TCP connection per call, runs a standard
//! rustls handshake (TLS 1.2 or 1.3, hostname verification + trust-store
//! validation), rebuilds
//! the verified chain, renders it as PEM and closes the connection.
//!
//! Any failure (DNS, connect, handshake, untrusted or mismatched chain,
//! parse) is logged and collapsed into [`RetrievedChain::Unavailable`], which
//! the decision step can only ever turn into a denial. There is no retry and
//! no timeout beyond what the OS applies to the TCP connect.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, error, info, warn};

use pin_core::RetrievedChain;

use super::assemble::{AnchorIndex, assemble_verified_chain};
use super::pem::der_to_pem;
use crate::config::TlsConfig;
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Source of the live certificate chain for a `host:port`.
///
/// Injected into the authorizer so the service shell owns its lifecycle and
/// tests can substitute a fixed chain. Implementations must not fail: every
/// problem is reported as [`RetrievedChain::Unavailable`].
#[async_trait]
pub trait ChainRetriever: Send + Sync {
    /// Fetch the verified chain presented by `host:port`.
    async fn retrieve(&self, host: &str, port: u16) -> RetrievedChain;
}

// ─────────────────────────────────────────────────────────────────────────────
// rustls implementation
// ─────────────────────────────────────────────────────────────────────────────

/// [`ChainRetriever`] backed by `tokio-rustls`.
#[derive(Clone)]
pub struct TlsChainRetriever {
    connector: TlsConnector,
    anchors: Arc<AnchorIndex>,
}

impl TlsChainRetriever {
    /// Build a retriever that trusts exactly `trust_roots`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if none of the roots is usable, or
    /// [`Error::Tls`] if the client config cannot be built.
    pub fn new(trust_roots: Vec<CertificateDer<'static>>) -> Result<Self> {
        let mut store = RootCertStore::empty();
        let (added, ignored) = store.add_parsable_certificates(trust_roots.iter().cloned());
        if ignored > 0 {
            warn!(ignored, "Ignored unparseable trust roots");
        }
        if added == 0 {
            return Err(Error::Config("No usable trust roots".to_string()));
        }

        let config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::aws_lc_rs::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(store)
        .with_no_client_auth();

        debug!(trust_roots = added, "TLS chain retriever configured");

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            anchors: Arc::new(AnchorIndex::new(&trust_roots)),
        })
    }

    /// Build a retriever over the operating system trust store.
    ///
    /// # Errors
    ///
    /// Returns an error if the system store yields no certificates.
    pub fn with_native_roots() -> Result<Self> {
        Self::new(load_native_roots()?)
    }

    /// Build a retriever from the `tls` section of the service config.
    ///
    /// A configured CA bundle replaces the system store.
    ///
    /// # Errors
    ///
    /// Returns an error if the trust roots cannot be loaded.
    pub fn from_config(config: &TlsConfig) -> Result<Self> {
        match config.ca_bundle.as_deref() {
            Some(path) => {
                info!(ca_bundle = %path, "Using configured CA bundle as trust store");
                Self::new(load_pem_bundle(Path::new(path))?)
            }
            None => {
                info!("Using system trust store");
                Self::with_native_roots()
            }
        }
    }

    async fn try_retrieve(&self, host: &str, port: u16) -> Result<Vec<String>> {
        let server_name = ServerName::try_from(host.to_owned())
            .map_err(|e| Error::Tls(format!("Invalid server name '{host}': {e}")))?;

        let stream = TcpStream::connect((host, port)).await?;
        let mut tls = self.connector.connect(server_name, stream).await?;

        let chain = {
            let (_, conn) = tls.get_ref();
            let presented = conn
                .peer_certificates()
                .ok_or_else(|| Error::Tls("Peer presented no certificates".to_string()))?;
            debug!(presented = presented.len(), "Handshake complete");
            assemble_verified_chain(presented, &self.anchors)?
        };

        if let Err(e) = tls.shutdown().await {
            debug!(error = %e, "TLS close_notify failed");
        }

        Ok(chain.iter().map(|der| der_to_pem(der.as_ref())).collect())
    }
}

#[async_trait]
impl ChainRetriever for TlsChainRetriever {
    async fn retrieve(&self, host: &str, port: u16) -> RetrievedChain {
        match self.try_retrieve(host, port).await {
            Ok(entries) => {
                debug!(host, port, length = entries.len(), "Retrieved verified chain");
                RetrievedChain::from_entries(entries)
            }
            Err(e) => {
                error!(host, port, error = %e, "Failed to retrieve certificate chain");
                RetrievedChain::Unavailable
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trust roots
// ─────────────────────────────────────────────────────────────────────────────

/// Load the operating system trust store.
///
/// # Errors
///
/// Returns [`Error::Config`] if no certificate could be loaded.
pub fn load_native_roots() -> Result<Vec<CertificateDer<'static>>> {
    let result = rustls_native_certs::load_native_certs();
    for e in &result.errors {
        warn!(error = %e, "Error loading system trust root");
    }
    if result.certs.is_empty() {
        return Err(Error::Config(
            "No trust roots found in the system store".to_string(),
        ));
    }
    Ok(result.certs)
}

/// Load every `CERTIFICATE` block from a PEM bundle.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read, is malformed, or
/// holds no certificates.
pub fn load_pem_bundle(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let data = std::fs::read(path)
        .map_err(|e| Error::Config(format!("Cannot read '{}': {e}", path.display())))?;

    let certs = CertificateDer::pem_slice_iter(&data)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            Error::Config(format!(
                "Failed to parse certificates from '{}': {e:?}",
                path.display()
            ))
        })?;

    if certs.is_empty() {
        return Err(Error::Config(format!(
            "No certificates found in '{}'",
            path.display()
        )));
    }

    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trust_store_is_rejected() {
        let result = TlsChainRetriever::new(Vec::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn garbage_trust_roots_are_rejected() {
        let junk = CertificateDer::from(vec![0x30, 0x03, 0x01, 0x01, 0xFF]);
        assert!(TlsChainRetriever::new(vec![junk]).is_err());
    }

    #[test]
    fn missing_bundle_file_is_config_error() {
        let err = load_pem_bundle(Path::new("/nonexistent/ca-bundle.pem")).unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }

    #[test]
    fn bundle_without_certificates_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pem");
        std::fs::write(&path, "not a pem file\n").unwrap();
        assert!(load_pem_bundle(&path).is_err());
    }
}
