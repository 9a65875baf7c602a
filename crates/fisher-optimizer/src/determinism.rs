//! Result digests.
//!
//! The `results_root` binds a batch hash to its ordered per-operation
//! outcome, so a submitter can check that a published settlement report
//! belongs to its batch without comparing full payloads.

use sha2::{Digest, Sha256};

/// Hash of `(batch_hash, results)`. Result order matters.
#[must_use]
pub fn compute_results_root(batch_hash: &[u8; 32], results: &[bool]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"fisher:results:v1:");
    hasher.update(batch_hash);
    hasher.update((results.len() as u64).to_le_bytes());

    // Pack flags 8 per byte.
    for chunk in results.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, ok)| acc | (u8::from(*ok) << i));
        hasher.update([byte]);
    }

    hasher.finalize().into()
}

/// Recompute and compare.
#[must_use]
pub fn verify_results_root(batch_hash: &[u8; 32], results: &[bool], expected_root: &[u8; 32]) -> bool {
    compute_results_root(batch_hash, results) == *expected_root
}
