//! Claim leaf encoding and merkle proof verification.
//!
//! The commitment for a period is a merkle root over one leaf per
//! `(claimant, amount)`. The root is computed off-path; the ledger only
//! verifies individual proofs against it.
//!
//! Leaf:
//! ```text
//! SHA-256("fisher:claim-leaf:v1:" || chain_id(8 LE) || contract(32)
//!         || claimant(32) || period(8 LE) || amount(16 LE) || version(2 LE))
//! ```
//!
//! Interior nodes hash the sorted pair, so proofs carry no left/right bits.

use fisher_types::{Address, DomainConfig, PeriodId};
use sha2::{Digest, Sha256};

/// 32-byte hash.
pub type Hash = [u8; 32];

/// Domain-separated leaf for one claim.
#[must_use]
pub fn claim_leaf(domain: &DomainConfig, claimant: &Address, period: PeriodId, amount: u128) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(b"fisher:claim-leaf:v1:");
    hasher.update(domain.chain_id.to_le_bytes());
    hasher.update(domain.contract.as_bytes());
    hasher.update(claimant.as_bytes());
    hasher.update(period.to_le_bytes());
    hasher.update(amount.to_le_bytes());
    hasher.update(domain.version.to_le_bytes());
    hasher.finalize().into()
}

/// Hash two children in sorted order.
#[must_use]
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(b"fisher:node:v1:");
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

/// Fold `proof` into `leaf`.
#[must_use]
pub fn compute_root(leaf: Hash, proof: &[Hash]) -> Hash {
    proof.iter().fold(leaf, |acc, sibling| hash_pair(&acc, sibling))
}

/// Whether `proof` authenticates `leaf` under `root`.
#[must_use]
pub fn verify_proof(leaf: Hash, proof: &[Hash], root: &Hash) -> bool {
    compute_root(leaf, proof) == *root
}

// ---------------------------------------------------------------------------
// ClaimTree (test helper: plays the off-path commitment collaborator)
// ---------------------------------------------------------------------------

/// Builds a claim tree and proofs for a closed period.
///
/// An odd node at the end of a layer is carried up unchanged.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone)]
pub struct ClaimTree {
    layers: Vec<Vec<Hash>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl ClaimTree {
    /// Build from `(claimant, amount)` entries for `period`.
    #[must_use]
    pub fn build(domain: &DomainConfig, period: PeriodId, entries: &[(Address, u128)]) -> Self {
        let leaves: Vec<Hash> = entries
            .iter()
            .map(|(who, amount)| claim_leaf(domain, who, period, *amount))
            .collect();
        let mut layers = vec![leaves];
        while layers.last().is_some_and(|l| l.len() > 1) {
            let prev = &layers[layers.len() - 1];
            let next: Vec<Hash> = prev
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(a, b),
                    _ => pair[0],
                })
                .collect();
            layers.push(next);
        }
        Self { layers }
    }

    /// Root of the tree; all-zero for an empty tree.
    #[must_use]
    pub fn root(&self) -> Hash {
        self.layers
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    /// Sibling path for the leaf at `index`.
    #[must_use]
    pub fn proof(&self, mut index: usize) -> Vec<Hash> {
        let mut proof = Vec::new();
        for layer in &self.layers[..self.layers.len().saturating_sub(1)] {
            let sibling = index ^ 1;
            if let Some(h) = layer.get(sibling) {
                proof.push(*h);
            }
            index /= 2;
        }
        proof
    }
}
