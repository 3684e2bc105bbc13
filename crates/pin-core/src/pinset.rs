//! Pinned chain for a single `host:port`.
//!
//! Certificate text is normalized once, at construction: every whitespace
//! character (including interior newlines and indentation from line-wrapped
//! PEM or pretty-printed JSON) is removed. Nothing else is transformed; no
//! case folding and no PEM/DER conversion. Comparison downstream is exact on
//! the normalized text.

use serde::{Deserialize, Serialize};

use crate::decision::CertRole;
use crate::error::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Remove every whitespace character from `text`.
///
/// Idempotent: `strip_whitespace(&strip_whitespace(s)) == strip_whitespace(s)`.
#[must_use]
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire record
// ─────────────────────────────────────────────────────────────────────────────

/// Raw pinned record as stored in the secret backend.
///
/// Every field is optional at this layer so that a missing field surfaces as
/// a [`ConfigError::MissingField`] naming it, rather than an opaque decode
/// error. `URL` is accepted as an alias of `Host`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRecord {
    /// Target host name (or IP literal).
    #[serde(rename = "Host", alias = "URL", default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Target TCP port.
    #[serde(rename = "Port", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,

    /// Leaf certificate text.
    #[serde(rename = "ServerCert", default, skip_serializing_if = "Option::is_none")]
    pub server_cert: Option<String>,

    /// Intermediate certificate text.
    #[serde(
        rename = "IntermediateCert",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub intermediate_cert: Option<String>,

    /// Root certificate text.
    #[serde(rename = "RootCert", default, skip_serializing_if = "Option::is_none")]
    pub root_cert: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// PinSet
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable, normalized pinned chain.
///
/// Only obtainable through [`PinSet::new`] or `TryFrom<PinRecord>`, both of
/// which validate presence of every field and normalize certificate text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSet {
    host: String,
    port: u16,
    server_cert: String,
    intermediate_cert: String,
    root_cert: String,
}

impl PinSet {
    /// Validate and normalize a pinned chain.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] if the host is empty, or a certificate
    ///   is empty once whitespace is stripped
    /// - [`ConfigError::InvalidPort`] if `port` is not in `1..=65535`
    pub fn new(
        host: &str,
        port: i64,
        server_cert: &str,
        intermediate_cert: &str,
        root_cert: &str,
    ) -> Result<Self, ConfigError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::MissingField("Host"));
        }

        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ConfigError::InvalidPort(port))?;

        Ok(Self {
            host: host.to_owned(),
            port,
            server_cert: normalized_field(server_cert, "ServerCert")?,
            intermediate_cert: normalized_field(intermediate_cert, "IntermediateCert")?,
            root_cert: normalized_field(root_cert, "RootCert")?,
        })
    }

    /// Target host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, for logs.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Normalized pinned certificate for `role`.
    #[must_use]
    pub fn cert(&self, role: CertRole) -> &str {
        match role {
            CertRole::Server => &self.server_cert,
            CertRole::Intermediate => &self.intermediate_cert,
            CertRole::Root => &self.root_cert,
        }
    }

    /// Convert back to the wire record (normalized certificate text).
    #[must_use]
    pub fn to_record(&self) -> PinRecord {
        PinRecord {
            host: Some(self.host.clone()),
            port: Some(i64::from(self.port)),
            server_cert: Some(self.server_cert.clone()),
            intermediate_cert: Some(self.intermediate_cert.clone()),
            root_cert: Some(self.root_cert.clone()),
        }
    }
}

impl TryFrom<PinRecord> for PinSet {
    type Error = ConfigError;

    fn try_from(record: PinRecord) -> Result<Self, Self::Error> {
        let host = record.host.ok_or(ConfigError::MissingField("Host"))?;
        let port = record.port.ok_or(ConfigError::MissingField("Port"))?;
        let server = record
            .server_cert
            .ok_or(ConfigError::MissingField("ServerCert"))?;
        let intermediate = record
            .intermediate_cert
            .ok_or(ConfigError::MissingField("IntermediateCert"))?;
        let root = record.root_cert.ok_or(ConfigError::MissingField("RootCert"))?;

        Self::new(&host, port, &server, &intermediate, &root)
    }
}

fn normalized_field(raw: &str, name: &'static str) -> Result<String, ConfigError> {
    let normalized = strip_whitespace(raw);
    if normalized.is_empty() {
        return Err(ConfigError::MissingField(name));
    }
    Ok(normalized)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> PinRecord {
        PinRecord {
            host: Some("api.example.com".to_owned()),
            port: Some(443),
            server_cert: Some("AAA".to_owned()),
            intermediate_cert: Some("BBB".to_owned()),
            root_cert: Some("CCC".to_owned()),
        }
    }

    // ── normalization ────────────────────────────────────────────────────────

    #[test]
    fn strip_whitespace_removes_interior_and_surrounding_whitespace() {
        assert_eq!(strip_whitespace("  A A\tA\r\n B\n"), "AAAB");
    }

    #[test]
    fn strip_whitespace_is_idempotent() {
        let inputs = ["", "   ", "AAA", " A\nB\tC ", "-----BEGIN CERTIFICATE-----\nMIIB\n"];
        for input in inputs {
            let once = strip_whitespace(input);
            assert_eq!(strip_whitespace(&once), once);
        }
    }

    #[test]
    fn strip_whitespace_keeps_case_and_punctuation() {
        assert_eq!(strip_whitespace("aB+/= -"), "aB+/=-");
    }

    #[test]
    fn construction_normalizes_line_wrapped_pem() {
        // GIVEN: pinned text wrapped and indented like a pretty-printed secret
        let pem = "-----BEGIN CERTIFICATE-----\n    MIIB\n    CgYI\n-----END CERTIFICATE-----\n";
        // WHEN: building the pin set
        let pins = PinSet::new("h", 443, pem, "BBB", "CCC").unwrap();
        // THEN: no whitespace survives
        assert_eq!(
            pins.cert(CertRole::Server),
            "-----BEGINCERTIFICATE-----MIIBCgYI-----ENDCERTIFICATE-----"
        );
    }

    // ── validation ───────────────────────────────────────────────────────────

    #[test]
    fn empty_server_cert_is_rejected() {
        let err = PinSet::new("h", 443, "", "BBB", "CCC").unwrap_err();
        assert_eq!(err, ConfigError::MissingField("ServerCert"));
    }

    #[test]
    fn whitespace_only_cert_counts_as_empty() {
        let err = PinSet::new("h", 443, "AAA", " \n\t ", "CCC").unwrap_err();
        assert_eq!(err, ConfigError::MissingField("IntermediateCert"));
    }

    #[test]
    fn empty_host_is_rejected() {
        let err = PinSet::new("  ", 443, "AAA", "BBB", "CCC").unwrap_err();
        assert_eq!(err, ConfigError::MissingField("Host"));
    }

    #[test]
    fn zero_negative_and_oversized_ports_are_rejected() {
        for port in [0, -1, 65_536] {
            let err = PinSet::new("h", port, "AAA", "BBB", "CCC").unwrap_err();
            assert_eq!(err, ConfigError::InvalidPort(port));
        }
    }

    #[test]
    fn boundary_ports_are_accepted() {
        assert_eq!(PinSet::new("h", 1, "A", "B", "C").unwrap().port(), 1);
        assert_eq!(PinSet::new("h", 65_535, "A", "B", "C").unwrap().port(), 65_535);
    }

    #[test]
    fn missing_record_fields_name_the_field() {
        let cases: [(fn(&mut PinRecord), &str); 5] = [
            (|r| r.host = None, "Host"),
            (|r| r.port = None, "Port"),
            (|r| r.server_cert = None, "ServerCert"),
            (|r| r.intermediate_cert = None, "IntermediateCert"),
            (|r| r.root_cert = None, "RootCert"),
        ];
        for (clear, field) in cases {
            let mut r = record();
            clear(&mut r);
            assert_eq!(
                PinSet::try_from(r).unwrap_err(),
                ConfigError::MissingField(field)
            );
        }
    }

    // ── wire form ────────────────────────────────────────────────────────────

    #[test]
    fn record_decodes_pascal_case_secret_layout() {
        let json = r#"{"Host":"h.example","Port":8443,"ServerCert":"A A","IntermediateCert":"B","RootCert":"C","Extra":1}"#;
        let r: PinRecord = serde_json::from_str(json).unwrap();
        let pins = PinSet::try_from(r).unwrap();
        assert_eq!(pins.target(), "h.example:8443");
        assert_eq!(pins.cert(CertRole::Server), "AA");
    }

    #[test]
    fn record_accepts_legacy_url_key() {
        let json = r#"{"URL":"legacy.example","Port":443,"ServerCert":"A","IntermediateCert":"B","RootCert":"C"}"#;
        let r: PinRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.host.as_deref(), Some("legacy.example"));
    }

    #[test]
    fn to_record_carries_normalized_text() {
        let pins = PinSet::new("h", 443, " A\nA ", "B B", "C").unwrap();
        let r = pins.to_record();
        assert_eq!(r.server_cert.as_deref(), Some("AA"));
        assert_eq!(r.intermediate_cert.as_deref(), Some("BB"));
        assert_eq!(PinSet::try_from(r).unwrap(), pins);
    }
}
