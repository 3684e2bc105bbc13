//! Live certificate chain retrieval.
//!
//! # Architecture
//!
//! ```text
//! host:port
//!   → TCP connect
//!   → TLS handshake  (rustls: hostname + trust-store validation)
//!   → presented certs + local anchor → verified chain   (assemble)
//!   → DER → PEM text, server-to-root order               (pem)
//!   → RetrievedChain::Available | RetrievedChain::Unavailable
//! ```
//!
//! # Modules
//!
//! - [`retriever`]: [`ChainRetriever`] trait and the rustls-backed [`TlsChainRetriever`]
//! - [`assemble`]: verified-path reconstruction by issuer/subject linkage
//! - [`pem`]: canonical PEM text rendering

pub mod assemble;
pub mod pem;
pub mod retriever;

pub use assemble::{AnchorIndex, MAX_CHAIN_DEPTH, assemble_verified_chain};
pub use pem::der_to_pem;
pub use retriever::{ChainRetriever, TlsChainRetriever, load_native_roots, load_pem_bundle};
