//! Cryptographic utilities for the rule audit
//!
//! This module provides:
//! - SHA-256 hashing of address text
//! - Hex suffix comparison for block hashes

pub mod hash;

pub use hash::{hex_suffix, sha256, sha256_hex};
