//! Content fingerprints used as lookup keys during conversion.
//!
//! Keys are deterministic hashes of the grouped text so identical input
//! always groups the same way across runs.

use sha2::{Digest, Sha256};

/// Compute the grouping key for a remediation summary.
///
/// Only the summary text participates: proposals with byte-identical
/// summaries describe the same upgrade action.
pub fn compute_remediation(summary: &str) -> String {
    hash(summary)
}

/// SHA-256 hash a string and return hex-encoded digest.
fn hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
