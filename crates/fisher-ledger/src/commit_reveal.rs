//! Commit-reveal claim submission.
//!
//! A claimant first commits to `H(claim, nonce)` and reveals the claim in a
//! later block. Observers of the commit learn nothing about the amount, and
//! a reveal can never be bundled into the same block as its commit.
//!
//! ```text
//! commit:  SHA-256("fisher:claim-commit:v1:" || chain_id || contract || claimant
//!                  || period || amount || nonce(32) || version)
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fisher_types::{Address, DomainConfig, FisherError, PeriodId, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::merkle::Hash;

/// Hash a claimant commits to before revealing.
#[must_use]
pub fn claim_commitment(
    domain: &DomainConfig,
    claimant: &Address,
    period: PeriodId,
    amount: u128,
    nonce: &[u8; 32],
) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(b"fisher:claim-commit:v1:");
    hasher.update(domain.chain_id.to_le_bytes());
    hasher.update(domain.contract.as_bytes());
    hasher.update(claimant.as_bytes());
    hasher.update(period.to_le_bytes());
    hasher.update(amount.to_le_bytes());
    hasher.update(nonce);
    hasher.update(domain.version.to_le_bytes());
    hasher.finalize().into()
}

/// A stored claim commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCommit {
    pub hash: Hash,
    pub block: u64,
    pub committed_at: DateTime<Utc>,
}

/// Open claim commitments, one per (claimant, period).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitRevealBook {
    commits: HashMap<(Address, PeriodId), ClaimCommit>,
}

impl CommitRevealBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or overwrite) a commitment. Overwriting restarts the block gap.
    pub fn commit(
        &mut self,
        claimant: Address,
        period: PeriodId,
        hash: Hash,
        block: u64,
        now: DateTime<Utc>,
    ) {
        self.commits.insert(
            (claimant, period),
            ClaimCommit {
                hash,
                block,
                committed_at: now,
            },
        );
        tracing::debug!(claimant = %claimant, period = %period, block, "Claim committed");
    }

    /// Check that a reveal matches a commitment made in an earlier block.
    pub fn check_reveal(
        &self,
        domain: &DomainConfig,
        claimant: Address,
        period: PeriodId,
        amount: u128,
        nonce: &[u8; 32],
        block: u64,
    ) -> Result<()> {
        let commit = self
            .commits
            .get(&(claimant, period))
            .ok_or(FisherError::NoClaimCommit { claimant, period })?;
        if block <= commit.block {
            return Err(FisherError::RevealTooEarly {
                committed_at: commit.block,
                block,
            });
        }
        if claim_commitment(domain, &claimant, period, amount, nonce) != commit.hash {
            return Err(FisherError::RevealMismatch { period });
        }
        Ok(())
    }

    /// Drop the commitment once its claim is settled.
    pub fn remove(&mut self, claimant: Address, period: PeriodId) -> Option<ClaimCommit> {
        self.commits.remove(&(claimant, period))
    }

    #[must_use]
    pub fn get(&self, claimant: Address, period: PeriodId) -> Option<&ClaimCommit> {
        self.commits.get(&(claimant, period))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use fisher_types::CallContext;

    use super::*;

    fn setup() -> (CommitRevealBook, DomainConfig, Address, DateTime<Utc>) {
        let who = Address::from_tag(4);
        (
            CommitRevealBook::new(),
            DomainConfig::default(),
            who,
            CallContext::at(who, 0).now,
        )
    }

    #[test]
    fn reveal_in_later_block_matches() {
        let (mut book, domain, who, now) = setup();
        let nonce = [7u8; 32];
        let h = claim_commitment(&domain, &who, PeriodId(0), 100, &nonce);
        book.commit(who, PeriodId(0), h, 10, now);
        assert!(book.check_reveal(&domain, who, PeriodId(0), 100, &nonce, 11).is_ok());
    }

    #[test]
    fn same_block_reveal_rejected() {
        let (mut book, domain, who, now) = setup();
        let nonce = [7u8; 32];
        let h = claim_commitment(&domain, &who, PeriodId(0), 100, &nonce);
        book.commit(who, PeriodId(0), h, 10, now);
        let err = book
            .check_reveal(&domain, who, PeriodId(0), 100, &nonce, 10)
            .unwrap_err();
        assert!(matches!(err, FisherError::RevealTooEarly { .. }));
    }

    #[test]
    fn wrong_amount_or_nonce_rejected() {
        let (mut book, domain, who, now) = setup();
        let nonce = [7u8; 32];
        let h = claim_commitment(&domain, &who, PeriodId(0), 100, &nonce);
        book.commit(who, PeriodId(0), h, 10, now);
        assert!(matches!(
            book.check_reveal(&domain, who, PeriodId(0), 101, &nonce, 11),
            Err(FisherError::RevealMismatch { .. })
        ));
        assert!(matches!(
            book.check_reveal(&domain, who, PeriodId(0), 100, &[8u8; 32], 11),
            Err(FisherError::RevealMismatch { .. })
        ));
    }

    #[test]
    fn missing_commit_rejected() {
        let (book, domain, who, _) = setup();
        assert!(matches!(
            book.check_reveal(&domain, who, PeriodId(0), 100, &[0u8; 32], 1),
            Err(FisherError::NoClaimCommit { .. })
        ));
    }

    #[test]
    fn commitment_binds_claimant() {
        let domain = DomainConfig::default();
        let nonce = [1u8; 32];
        let a = claim_commitment(&domain, &Address::from_tag(1), PeriodId(0), 5, &nonce);
        let b = claim_commitment(&domain, &Address::from_tag(2), PeriodId(0), 5, &nonce);
        assert_ne!(a, b);
    }

    #[test]
    fn removed_commit_cannot_be_revealed() {
        let (mut book, domain, who, now) = setup();
        let nonce = [7u8; 32];
        let h = claim_commitment(&domain, &who, PeriodId(0), 100, &nonce);
        book.commit(who, PeriodId(0), h, 10, now);
        assert!(book.remove(who, PeriodId(0)).is_some());
        assert!(book.is_empty());
        assert!(matches!(
            book.check_reveal(&domain, who, PeriodId(0), 100, &nonce, 11),
            Err(FisherError::NoClaimCommit { .. })
        ));
    }
}
