//! Request signing for the Letterboxd API.
//!
//! Each request carries `apikey`, `nonce` and `timestamp` query parameters and
//! a `signature`: the lowercase hex HMAC-SHA256 of
//! `METHOD \0 URL \0 BODY`, keyed with the API secret, where `URL` already
//! contains the three parameters above.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the request signature.
///
/// Returns `None` only if the MAC rejects the key, which HMAC never does.
pub(crate) fn sign(secret: &str, method: &str, url: &str, body: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(method.as_bytes());
    mac.update(&[0]);
    mac.update(url.as_bytes());
    mac.update(&[0]);
    mac.update(body.as_bytes());
    Some(to_hex(&mac.finalize().into_bytes()))
}

/// Generates a random version-4 UUID string for the `nonce` parameter.
pub(crate) fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes[..]);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    let hex = to_hex(&bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Seconds since the Unix epoch (0 if the clock is before it).
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
