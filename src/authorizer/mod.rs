//! Pinned-chain authorizer.
//!
//! One invocation is a single linear pass with no state carried over:
//!
//! ```text
//! Start → load PinSet ──(ConfigError)──────────────────────────▶ Deny
//!              │
//!              ▼
//!         retrieve chain  (never fails; degrades to Unavailable)
//!              │
//!              ▼
//!         compare per role → Allow | Deny
//! ```
//!
//! The pin source and chain retriever are injected, so the service shell
//! owns their lifecycle and tests can swap in fixed values.

pub mod policy;

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use pin_core::{CertRole, ComparisonResult, Decision, PinSet, RetrievedChain, compare};

use crate::chain::ChainRetriever;
use crate::source::PinSource;

pub use policy::{AuthorizerRequest, PolicyResponse, generate_policy};

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed outcome of one invocation, for operator tooling and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Pinned configuration could not be loaded; nothing was retrieved.
    ConfigFailed {
        /// Operator-facing cause.
        reason: String,
    },
    /// Chain retrieved (possibly unavailable) and compared.
    Compared {
        /// `host:port` that was contacted.
        target: String,
        /// Number of certificates retrieved (0 when unavailable).
        chain_length: usize,
        /// Per-role results.
        results: ComparisonResult,
    },
}

impl Evaluation {
    /// Final decision.
    #[must_use]
    pub fn decision(&self) -> Decision {
        match self {
            Self::ConfigFailed { .. } => Decision::Deny,
            Self::Compared { results, .. } => results.decision(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorizer
// ─────────────────────────────────────────────────────────────────────────────

/// Pinned-chain authorizer.
#[derive(Clone)]
pub struct Authorizer {
    pins: Arc<dyn PinSource>,
    retriever: Arc<dyn ChainRetriever>,
}

impl Authorizer {
    /// Create an authorizer over the given collaborators.
    #[must_use]
    pub fn new(pins: Arc<dyn PinSource>, retriever: Arc<dyn ChainRetriever>) -> Self {
        Self { pins, retriever }
    }

    /// Answer an authorization request with a policy document.
    pub async fn authorize(&self, request: &AuthorizerRequest) -> PolicyResponse {
        let principal = request.principal();
        info!(
            method_arn = %request.method_arn,
            principal = %principal,
            "Received authorization request"
        );

        let decision = self.evaluate().await.decision();

        info!(principal = %principal, decision = %decision, "Authorization decided");
        generate_policy(principal, decision, &request.method_arn)
    }

    /// Run one pass of the pipeline and report every intermediate result.
    pub async fn evaluate(&self) -> Evaluation {
        let pins = match self.pins.load().await {
            Ok(pins) => pins,
            Err(e) => {
                error!(error = %e, config_error = e.is_config_error(), "Error retrieving pinned configuration");
                return Evaluation::ConfigFailed {
                    reason: e.to_string(),
                };
            }
        };

        let target = pins.target();
        info!(peer = %target, "Retrieving the verified certificate chain");

        let chain = self.retriever.retrieve(pins.host(), pins.port()).await;
        if chain.is_empty() {
            error!(peer = %target, "Failed to retrieve any certificates from the server");
        }

        let results = compare(&pins, &chain);
        log_results(&pins, &chain, &results);

        Evaluation::Compared {
            target,
            chain_length: chain.len(),
            results,
        }
    }
}

fn log_results(pins: &PinSet, chain: &RetrievedChain, results: &ComparisonResult) {
    for (role, matched) in results.iter() {
        let retrieved = chain.extract(role.position());
        debug!(role = %role, retrieved = ?retrieved, "Received certificate");
        info!(role = %role, matched, "Certificate match");

        if !matched {
            log_mismatch(pins, role, retrieved.as_deref());
        }
    }
}

fn log_mismatch(pins: &PinSet, role: CertRole, retrieved: Option<&str>) {
    match retrieved {
        Some(text) => debug!(
            role = %role,
            pinned_sha256 = %fingerprint(pins.cert(role)),
            retrieved_sha256 = %fingerprint(text),
            "Pinned certificate differs from presented certificate"
        ),
        None => warn!(
            role = %role,
            position = role.position(),
            "Presented chain has no certificate at this position"
        ),
    }
}

/// SHA-256 of normalized certificate text, hex encoded.
fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()).as_slice())
}
