//! Hashing helpers for the address/block-hash affinity rule
//!
//! Block hashes are compared in the display order the node reports them in,
//! which is the internal byte order reversed.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Last `count` characters of a hex string (the whole string if shorter)
pub fn hex_suffix(hex: &str, count: usize) -> &str {
    let start = hex.len().saturating_sub(count);
    hex.get(start..).unwrap_or(hex)
}
