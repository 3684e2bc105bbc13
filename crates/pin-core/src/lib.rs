//! Certificate-chain pinning core.
//!
//! Network-free building blocks for deciding whether the chain a server
//! presents is exactly the chain pinned for it:
//!
//! - [`PinSet`]: validated, whitespace-normalized pinned chain for one `host:port`
//! - [`RetrievedChain`]: the live chain, or an explicit `Unavailable` marker
//! - [`extract`]: bounds-safe, normalizing positional accessor
//! - [`decide`] / [`compare`]: position-by-position comparison and the
//!   binary [`Decision`]
//!
//! # Pipeline
//!
//! ```text
//! PinRecord ──PinSet::try_from──▶ PinSet ─┐
//!                                         ├─▶ compare ─▶ ComparisonResult ─▶ Decision
//! live chain ──────────▶ RetrievedChain ──┘
//! ```
//!
//! Every failure mode collapses into [`Decision::Deny`]; there is no
//! soft-allow state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chain;
pub mod decision;
pub mod error;
pub mod pinset;

pub use chain::{RetrievedChain, extract};
pub use decision::{CertRole, ComparisonResult, Decision, compare, decide};
pub use error::ConfigError;
pub use pinset::{PinRecord, PinSet, strip_whitespace};
