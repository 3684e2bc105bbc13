//! Verified-chain assembly.
//!
//! rustls exposes only what the peer *presented* (leaf plus whatever
//! intermediates it chose to send, usually not the root). The pinned
//! comparison needs the path the TLS stack actually validated, ending at the
//! local trust anchor. This module rebuilds that path after a successful
//! handshake by issuer/subject linkage:
//!
//! 1. Start at the leaf.
//! 2. If the current certificate is self-issued, stop.
//! 3. If a local trust anchor has the current issuer as subject, append it
//!    (anchors are consulted first, like webpki's path builder).
//! 4. Otherwise append the presented certificate whose subject is the
//!    current issuer.
//! 5. Repeat from 2. Stop when nothing links, or after [`MAX_CHAIN_DEPTH`]
//!    certificates.
//!
//! Step 3 does not end the walk: a trust store holding both an intermediate
//! and its root (a typical `ca-chain.pem`) still yields the path up to the
//! self-issued root.
//!
//! Signatures are not re-checked here: the handshake already verified them
//! and this only recovers the order.

use rustls::pki_types::CertificateDer;
use tracing::{debug, warn};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::{Error, Result};

/// Upper bound on assembled chain length.
pub const MAX_CHAIN_DEPTH: usize = 8;

// ─────────────────────────────────────────────────────────────────────────────
// Link
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Link {
    der: CertificateDer<'static>,
    subject: Vec<u8>,
    issuer: Vec<u8>,
}

impl Link {
    fn parse(der: &CertificateDer<'_>) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der.as_ref())
            .map_err(|e| Error::Tls(format!("Failed to parse certificate: {e}")))?;

        Ok(Self {
            der: der.clone().into_owned(),
            subject: cert.subject().as_raw().to_vec(),
            issuer: cert.issuer().as_raw().to_vec(),
        })
    }

    fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trust anchor index
// ─────────────────────────────────────────────────────────────────────────────

/// Trust-store certificates indexed by subject, built once per retriever.
#[derive(Debug, Clone, Default)]
pub struct AnchorIndex {
    anchors: Vec<Link>,
}

impl AnchorIndex {
    /// Index trust-store certificates. Unparseable entries are skipped.
    #[must_use]
    pub fn new(certs: &[CertificateDer<'static>]) -> Self {
        let anchors: Vec<Link> = certs
            .iter()
            .filter_map(|der| match Link::parse(der) {
                Ok(link) => Some(link),
                Err(e) => {
                    warn!(error = %e, "Skipping unparseable trust anchor");
                    None
                }
            })
            .collect();

        debug!(anchors = anchors.len(), "Trust anchor index built");
        Self { anchors }
    }

    /// Number of indexed anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// `true` when no anchor could be indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    fn issuer_of(&self, cert: &Link) -> Option<&Link> {
        self.anchors.iter().find(|a| a.subject == cert.issuer)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Assembly
// ─────────────────────────────────────────────────────────────────────────────

/// Rebuild the verified chain (leaf first, anchor last) from the certificates
/// the peer presented.
///
/// # Errors
///
/// Returns [`Error::Tls`] if a presented certificate cannot be parsed.
pub fn assemble_verified_chain(
    presented: &[CertificateDer<'_>],
    anchors: &AnchorIndex,
) -> Result<Vec<CertificateDer<'static>>> {
    let mut pool = presented
        .iter()
        .map(Link::parse)
        .collect::<Result<Vec<_>>>()?;

    if pool.is_empty() {
        return Ok(Vec::new());
    }

    let mut chain = vec![pool.remove(0)];

    while chain.len() < MAX_CHAIN_DEPTH {
        let Some(current) = chain.last() else { break };
        if current.is_self_issued() {
            break;
        }

        // An anchor that is itself issued (e.g. an intermediate from a CA
        // bundle) keeps the walk going up to its own issuer.
        if let Some(anchor) = anchors.issuer_of(current) {
            let anchor = anchor.clone();
            chain.push(anchor);
            continue;
        }

        match pool.iter().position(|c| c.subject == current.issuer) {
            Some(idx) => {
                let next = pool.remove(idx);
                chain.push(next);
            }
            None => break,
        }
    }

    Ok(chain.into_iter().map(|link| link.der).collect())
}
