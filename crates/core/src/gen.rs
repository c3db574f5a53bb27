//! # Generate
//!
//! Random string generation for nonces.

use base64ct::{Base64UrlUnpadded, Encoding};

const SAFE_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789)(*&^%$#@!~";
const NONCE_LEN: usize = 32;

/// Generates a base64 encoded random string for a nonce.
#[must_use]
pub fn nonce() -> String {
    let rnd = random_string(NONCE_LEN, SAFE_CHARS);
    Base64UrlUnpadded::encode_string(rnd.as_bytes())
}

// Generates a random string from a given set of characters. Uses fastrand so
// is not cryptographically secure.
fn random_string(len: usize, charset: &str) -> String {
    let chars: Vec<char> = charset.chars().collect();
    (0..len).map(|_| chars[fastrand::usize(..chars.len())]).collect()
}
