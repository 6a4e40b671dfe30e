//! Signature base-string construction and HMAC computation for both
//! schemes (spec.md §4.8).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `"{timestamp}.{fullPath}.{rawBody}"` — the plain timestamp scheme's
/// signature base string.
pub fn timestamp_base_string(timestamp: &str, path: &str, body: &[u8]) -> Vec<u8> {
    let mut base = Vec::with_capacity(timestamp.len() + path.len() + body.len() + 2);
    base.extend_from_slice(timestamp.as_bytes());
    base.push(b'.');
    base.extend_from_slice(path.as_bytes());
    base.push(b'.');
    base.extend_from_slice(body);
    base
}

/// `"{timestamp}.{rawBody}"` — the Battlemetrics scheme's signature base
/// string (no path component).
pub fn battlemetrics_base_string(timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut base = Vec::with_capacity(timestamp.len() + body.len() + 1);
    base.extend_from_slice(timestamp.as_bytes());
    base.push(b'.');
    base.extend_from_slice(body);
    base
}

/// HMAC-SHA256(`secret`, `base`), hex-encoded.
pub fn sign(secret: &str, base: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base);
    hex::encode(mac.finalize().into_bytes())
}
