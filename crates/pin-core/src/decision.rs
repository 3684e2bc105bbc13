//! Position-by-position comparison and the allow/deny decision.
//!
//! # Evaluation
//!
//! | Role | Chain position |
//! |------|----------------|
//! | [`CertRole::Server`] | 0 |
//! | [`CertRole::Intermediate`] | 1 |
//! | [`CertRole::Root`] | 2 |
//!
//! A role matches only if the retrieved position exists **and** its
//! normalized text equals the pinned text. A missing position never matches
//! (no "not applicable" state). [`Decision::Allow`] requires all three roles
//! to match; anything else is [`Decision::Deny`].

use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::chain::RetrievedChain;
use crate::pinset::PinSet;

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a certificate within a pinned chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertRole {
    /// Leaf certificate presented by the server.
    Server,
    /// Issuing intermediate authority.
    Intermediate,
    /// Trust anchor.
    Root,
}

impl CertRole {
    /// All roles in chain order.
    pub const ALL: [Self; 3] = [Self::Server, Self::Intermediate, Self::Root];

    /// Index of this role in a server-to-root chain.
    #[must_use]
    pub const fn position(self) -> usize {
        match self {
            Self::Server => 0,
            Self::Intermediate => 1,
            Self::Root => 2,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Server => "Server Certificate",
            Self::Intermediate => "Intermediate Certificate",
            Self::Root => "Root Certificate",
        }
    }
}

impl fmt::Display for CertRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision
// ─────────────────────────────────────────────────────────────────────────────

/// Binary authorization outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Live chain equals the pinned chain.
    Allow,
    /// Anything else.
    Deny,
}

impl Decision {
    /// `true` for [`Decision::Allow`].
    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Deny => f.write_str("Deny"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Comparison
// ─────────────────────────────────────────────────────────────────────────────

/// Per-role match results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Leaf matched.
    pub server: bool,
    /// Intermediate matched.
    pub intermediate: bool,
    /// Root matched.
    pub root: bool,
}

impl ComparisonResult {
    /// Whether `role` matched.
    #[must_use]
    pub const fn matched(&self, role: CertRole) -> bool {
        match role {
            CertRole::Server => self.server,
            CertRole::Intermediate => self.intermediate,
            CertRole::Root => self.root,
        }
    }

    /// `(role, matched)` pairs in chain order.
    pub fn iter(&self) -> impl Iterator<Item = (CertRole, bool)> + '_ {
        CertRole::ALL.into_iter().map(|role| (role, self.matched(role)))
    }

    /// Roles that did not match.
    #[must_use]
    pub fn mismatched(&self) -> Vec<CertRole> {
        self.iter()
            .filter_map(|(role, ok)| (!ok).then_some(role))
            .collect()
    }

    /// Decision implied by these results.
    #[must_use]
    pub const fn decision(&self) -> Decision {
        if self.server && self.intermediate && self.root {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Compare each pinned role against the retrieved chain.
#[must_use]
pub fn compare(pins: &PinSet, chain: &RetrievedChain) -> ComparisonResult {
    let role_matches = |role: CertRole| {
        chain
            .extract(role.position())
            .is_some_and(|retrieved| texts_equal(pins.cert(role), &retrieved))
    };

    ComparisonResult {
        server: role_matches(CertRole::Server),
        intermediate: role_matches(CertRole::Intermediate),
        root: role_matches(CertRole::Root),
    }
}

/// Decide whether the retrieved chain satisfies the pins.
///
/// Pure: identical inputs always yield the same decision.
#[must_use]
pub fn decide(pins: &PinSet, chain: &RetrievedChain) -> Decision {
    compare(pins, chain).decision()
}

/// Exact equality in constant time with respect to content.
fn texts_equal(pinned: &str, retrieved: &str) -> bool {
    pinned.as_bytes().ct_eq(retrieved.as_bytes()).into()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pins() -> PinSet {
        PinSet::new("api.example.com", 443, "AAA", "BBB", "CCC").unwrap()
    }

    fn chain(entries: &[&str]) -> RetrievedChain {
        RetrievedChain::from_entries(entries.iter().map(|s| (*s).to_owned()).collect())
    }

    // ── allow ────────────────────────────────────────────────────────────────

    #[test]
    fn whitespace_differences_still_allow() {
        // GIVEN: retrieved text that differs only in whitespace
        let retrieved = chain(&[" A A A\n", "B B B", "CCC"]);
        // THEN: all roles match
        assert_eq!(decide(&pins(), &retrieved), Decision::Allow);
    }

    #[test]
    fn extra_chain_entries_beyond_root_do_not_matter() {
        let retrieved = chain(&["AAA", "BBB", "CCC", "DDD"]);
        assert_eq!(decide(&pins(), &retrieved), Decision::Allow);
    }

    // ── deny ─────────────────────────────────────────────────────────────────

    #[test]
    fn missing_root_position_denies() {
        let retrieved = chain(&["AAA", "BBB"]);
        let result = compare(&pins(), &retrieved);
        assert_eq!(
            result,
            ComparisonResult {
                server: true,
                intermediate: true,
                root: false
            }
        );
        assert_eq!(result.decision(), Decision::Deny);
    }

    #[test]
    fn unavailable_chain_denies() {
        let result = compare(&pins(), &RetrievedChain::Unavailable);
        assert_eq!(result.mismatched(), CertRole::ALL.to_vec());
        assert_eq!(decide(&pins(), &RetrievedChain::Unavailable), Decision::Deny);
    }

    #[test]
    fn intermediate_mismatch_denies() {
        let retrieved = chain(&["AAA", "XXX", "CCC"]);
        let result = compare(&pins(), &retrieved);
        assert_eq!(result.mismatched(), vec![CertRole::Intermediate]);
        assert_eq!(result.decision(), Decision::Deny);
    }

    #[test]
    fn each_single_position_mismatch_denies() {
        for role in CertRole::ALL {
            let mut entries = vec!["AAA", "BBB", "CCC"];
            entries[role.position()] = "ZZZ";
            let result = compare(&pins(), &chain(&entries));
            assert_eq!(result.mismatched(), vec![role]);
            assert_eq!(result.decision(), Decision::Deny);
        }
    }

    #[test]
    fn chains_shorter_than_three_never_allow() {
        for len in 0..3 {
            let entries: Vec<&str> = ["AAA", "BBB", "CCC"][..len].to_vec();
            assert_eq!(decide(&pins(), &chain(&entries)), Decision::Deny);
        }
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let retrieved = chain(&["aaa", "BBB", "CCC"]);
        assert_eq!(decide(&pins(), &retrieved), Decision::Deny);
    }

    #[test]
    fn shifted_chain_denies() {
        // Chain missing the leaf shifts every role by one position.
        let retrieved = chain(&["BBB", "CCC"]);
        assert_eq!(compare(&pins(), &retrieved), ComparisonResult::default());
    }

    #[test]
    fn decide_is_deterministic() {
        let retrieved = chain(&["AAA", "BBB", "CCC"]);
        let first = decide(&pins(), &retrieved);
        for _ in 0..10 {
            assert_eq!(decide(&pins(), &retrieved), first);
        }
    }

    // ── roles ────────────────────────────────────────────────────────────────

    #[test]
    fn roles_map_to_chain_positions() {
        let positions: Vec<usize> = CertRole::ALL.iter().map(|r| r.position()).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn decision_serializes_as_policy_effect() {
        assert_eq!(serde_json::to_string(&Decision::Allow).unwrap(), "\"Allow\"");
        assert_eq!(serde_json::to_string(&Decision::Deny).unwrap(), "\"Deny\"");
        assert_eq!(Decision::Deny.to_string(), "Deny");
    }
}
