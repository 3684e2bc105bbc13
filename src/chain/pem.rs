//! Canonical text form for retrieved certificates.
//!
//! DER is rendered as a PEM `CERTIFICATE` block: standard base64 wrapped at
//! 64 columns, header and footer on their own lines, trailing newline.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
const PEM_FOOTER: &str = "-----END CERTIFICATE-----";
const LINE_WIDTH: usize = 64;

/// Encode a DER certificate as PEM text.
#[must_use]
pub fn der_to_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 64);

    pem.push_str(PEM_HEADER);
    pem.push('\n');
    // base64 output is ASCII, so byte chunks are char boundaries
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    pem
}
