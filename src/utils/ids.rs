// src/utils/ids.rs

//! Stable short identifiers derived from entity content.

use sha2::{Digest, Sha256};

/// Hex digest truncated to 12 characters over the joined parts.
///
/// Parts are length-prefixed before hashing so ("ab","c") and ("a","bc")
/// produce different digests.
pub fn short_digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.len().to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..6])
}

/// Mint a prefixed identifier, e.g. `cr-3f9a12bc04de`.
pub fn mint(prefix: &str, parts: &[&str]) -> String {
    format!("{}-{}", prefix, short_digest(parts))
}
