//! Retrieved certificate chain and positional extraction.

use crate::pinset::strip_whitespace;

/// Outcome of fetching a live chain.
///
/// Either an ordered, non-empty chain (position 0 = leaf, 1 = intermediate,
/// 2 = root) or an explicit `Unavailable` marker. Comparison treats
/// `Unavailable` exactly like an empty chain, so a retrieval failure can
/// only ever produce a denial.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetrievedChain {
    /// Chain as verified by the TLS stack, in canonical text form.
    Available(Vec<String>),
    /// Retrieval failed at some stage.
    #[default]
    Unavailable,
}

impl RetrievedChain {
    /// Build from retrieved entries; an empty list becomes `Unavailable`.
    #[must_use]
    pub fn from_entries(entries: Vec<String>) -> Self {
        if entries.is_empty() {
            Self::Unavailable
        } else {
            Self::Available(entries)
        }
    }

    /// Entries in server-to-root order (empty when unavailable).
    #[must_use]
    pub fn entries(&self) -> &[String] {
        match self {
            Self::Available(entries) => entries,
            Self::Unavailable => &[],
        }
    }

    /// Number of certificates retrieved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// `true` when nothing was retrieved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Normalized entry at `position`, or `None` past the end.
    #[must_use]
    pub fn extract(&self, position: usize) -> Option<String> {
        extract(self.entries(), position)
    }
}

/// Normalized certificate text at `position`, or `None` if out of range.
///
/// Uses the same whitespace stripping as [`crate::PinSet`]. Never panics.
#[must_use]
pub fn extract(chain: &[String], position: usize) -> Option<String> {
    chain.get(position).map(|entry| strip_whitespace(entry))
}
