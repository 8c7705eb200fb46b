//! Content hashes with domain separation.
//!
//! Algorithm: SHA-256. Each hashed surface has its own null-terminated
//! domain prefix so equal bytes from different surfaces never collide.

use sha2::{Digest, Sha256};

/// A content-addressed hash in `"algorithm:hex_digest"` form.
///
/// Invariant: exactly one `:` separator with non-empty text on both sides
/// (enforced by [`ContentHash::parse`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    full: String,
    colon: usize,
}

impl ContentHash {
    /// Parse from `"algorithm:hex"`.
    ///
    /// Returns `None` when the separator is missing or either side is empty.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (algorithm, digest) = s.split_once(':')?;
        if algorithm.is_empty() || digest.is_empty() || digest.contains(':') {
            return None;
        }
        Some(Self {
            full: s.to_string(),
            colon: algorithm.len(),
        })
    }

    /// The algorithm portion (e.g. `"sha256"`).
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.full[..self.colon]
    }

    /// The hex digest portion.
    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.full[self.colon + 1..]
    }

    /// The full `"algorithm:hex_digest"` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// Domain prefix for discovery plan digests.
pub const DOMAIN_DISCOVERY_PLAN: &[u8] = b"CHECKPOINT::DISCOVERY_PLAN::V1\0";

/// Domain prefix for suite report digests.
pub const DOMAIN_SUITE_REPORT: &[u8] = b"CHECKPOINT::SUITE_REPORT::V1\0";

/// SHA-256 of `domain || data`, as `"sha256:<hex>"`.
#[must_use]
pub fn canonical_hash(domain: &[u8], data: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    let hex_digest = hex::encode(hasher.finalize());
    ContentHash {
        colon: "sha256".len(),
        full: format!("sha256:{hex_digest}"),
    }
}
