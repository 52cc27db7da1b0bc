//! Cache key derivation.

use sha2::{Digest, Sha256};

/// Length of every cache key in characters.
pub const KEY_LEN: usize = 64;

/// Compute the cache key for a normalized URL.
///
/// The key is the hex-encoded SHA-256 of the URL string, so it only ever
/// contains `[0-9a-f]` and is safe to use as a file name on every platform.
pub fn compute_cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `key` has the shape produced by [`compute_cache_key`].
pub fn is_valid_key(key: &str) -> bool {
    key.len() == KEY_LEN && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
