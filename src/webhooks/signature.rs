//! Delivery authentication using GitHub's HMAC-SHA256 webhook signatures.
//!
//! GitHub signs each delivery body with the shared webhook secret and sends
//! the digest in `X-Hub-Signature-256` as `sha256=<hex>`. A delivery is only
//! decoded after its signature checks out.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Accepts or rejects a delivery based on its body and signature header.
///
/// The bot ships [`HmacSha256Verifier`]; tests and embedders can swap in
/// their own.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `true` if `signature_header` is a valid signature of `payload`
    /// under `secret`. Must not panic on malformed input.
    fn verify(&self, payload: &[u8], signature_header: &str, secret: &[u8]) -> bool;
}

/// Verifies `sha256=<hex>` signatures with a constant-time comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256Verifier;

impl SignatureVerifier for HmacSha256Verifier {
    fn verify(&self, payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
        verify_signature(payload, signature_header, secret)
    }
}

/// Decodes the hex digest out of a `sha256=<hex>` header value.
///
/// Returns `None` for a missing prefix, another algorithm, or bad hex.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix(SIGNATURE_PREFIX)?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 digest of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a digest the way GitHub sends it (`sha256=<hex>`).
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{SIGNATURE_PREFIX}{}", hex::encode(signature))
}

/// Signs `payload` and formats the header in one step.
///
/// Handy for anything that has to impersonate GitHub, such as local replay
/// tooling and tests.
pub fn sign_payload(payload: &[u8], secret: &[u8]) -> String {
    format_signature_header(&compute_signature(payload, secret))
}

/// Checks `signature_header` against the HMAC-SHA256 of `payload`.
///
/// # Examples
///
/// ```
/// use hookwire::webhooks::{sign_payload, verify_signature};
///
/// let body = br#"{"zen": "Keep it logically awesome."}"#;
/// let header = sign_payload(body, b"s3cret");
///
/// assert!(verify_signature(body, &header, b"s3cret"));
/// assert!(!verify_signature(body, &header, b"other"));
/// assert!(!verify_signature(body, "sha1=deadbeef", b"s3cret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);

    // verify_slice compares in constant time
    mac.verify_slice(&expected).is_ok()
}
