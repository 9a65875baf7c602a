//! Per-period settlement commitments and the dispute lifecycle.
//!
//! ```text
//! post ──► objection window ──► (claim delay) ──► claims open ──► deadline
//!   │
//!   └─ guardian dispute ──► resolution delay ──► authority replace (+1 strike)
//! ```
//!
//! A commitment is a merkle root over the full claim set of a closed
//! period. While disputed, the period accepts no claims and no re-post;
//! only a replacement clears the dispute.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use fisher_types::{
    Address, ClaimConfig, FisherError, PeriodId, RecoveryConfig, Result, add_duration,
};
use serde::{Deserialize, Serialize};

use crate::merkle::Hash;

/// An open challenge against a posted commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub guardian: Address,
    pub raised_at: DateTime<Utc>,
    pub resolve_not_before: DateTime<Utc>,
}

/// The posted root for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub period: PeriodId,
    pub root: Hash,
    /// Time of the latest post or replacement. Drives the objection window
    /// and the claim delay.
    pub posted_at: DateTime<Utc>,
    pub first_posted_at: DateTime<Utc>,
    /// Fixed at first post; later posts never extend it.
    pub claim_deadline: DateTime<Utc>,
    pub replacements: u32,
    pub dispute: Option<Dispute>,
}

impl Commitment {
    #[must_use]
    pub fn is_disputed(&self) -> bool {
        self.dispute.is_some()
    }

    #[must_use]
    pub fn root_hex(&self) -> String {
        hex::encode(self.root)
    }
}

/// Every period's commitment plus per-guardian dispute cooldowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentBook {
    commitments: BTreeMap<PeriodId, Commitment>,
    last_dispute_by: HashMap<Address, DateTime<Utc>>,
    claims: ClaimConfig,
    recovery: RecoveryConfig,
}

impl CommitmentBook {
    #[must_use]
    pub fn new(claims: ClaimConfig, recovery: RecoveryConfig) -> Self {
        Self {
            commitments: BTreeMap::new(),
            last_dispute_by: HashMap::new(),
            claims,
            recovery,
        }
    }

    /// Post `root` for `period`.
    ///
    /// A period that already has a commitment may only be re-posted once
    /// the objection window of the prior post has elapsed without a
    /// dispute. The claim deadline set by the first post is kept.
    pub fn post(&mut self, period: PeriodId, root: Hash, now: DateTime<Utc>) -> Result<&Commitment> {
        let reposted = match self.commitments.get(&period) {
            Some(existing) => {
                if existing.is_disputed() {
                    return Err(FisherError::CommitmentDisputed(period));
                }
                let window_ends = add_duration(existing.posted_at, self.recovery.objection_window);
                if now < window_ends {
                    return Err(FisherError::DisputePeriodActive {
                        period,
                        remaining: (window_ends - now).to_std().unwrap_or_default(),
                    });
                }
                true
            }
            None => false,
        };

        let claim_deadline = add_duration(now, self.claims.claim_window);
        let commitment = self
            .commitments
            .entry(period)
            .and_modify(|c| {
                c.root = root;
                c.posted_at = now;
            })
            .or_insert(Commitment {
                period,
                root,
                posted_at: now,
                first_posted_at: now,
                claim_deadline,
                replacements: 0,
                dispute: None,
            });
        tracing::info!(
            period = %period,
            root = %commitment.root_hex(),
            deadline = %commitment.claim_deadline,
            reposted,
            "Commitment posted"
        );
        Ok(commitment)
    }

    /// Guardian challenges the commitment for `period`.
    pub fn dispute(&mut self, guardian: Address, period: PeriodId, now: DateTime<Utc>) -> Result<()> {
        let commitment = self
            .commitments
            .get(&period)
            .ok_or(FisherError::NoCommitment(period))?;
        if commitment.is_disputed() {
            return Err(FisherError::CommitmentDisputed(period));
        }
        if now >= add_duration(commitment.posted_at, self.recovery.objection_window) {
            return Err(FisherError::DisputeWindowClosed(period));
        }
        if let Some(last) = self.last_dispute_by.get(&guardian) {
            let ready_at = add_duration(*last, self.recovery.dispute_cooldown);
            if now < ready_at {
                return Err(FisherError::DisputeCooldown {
                    remaining: (ready_at - now).to_std().unwrap_or_default(),
                });
            }
        }

        let dispute = Dispute {
            guardian,
            raised_at: now,
            resolve_not_before: add_duration(now, self.recovery.resolution_delay),
        };
        if let Some(c) = self.commitments.get_mut(&period) {
            c.dispute = Some(dispute);
        }
        self.last_dispute_by.insert(guardian, now);
        tracing::warn!(
            period = %period,
            guardian = %guardian,
            resolve_not_before = %dispute.resolve_not_before,
            "Commitment disputed"
        );
        Ok(())
    }

    /// Authority replaces a disputed commitment after the resolution delay.
    /// Returns the replacement count for the period.
    pub fn replace(&mut self, period: PeriodId, root: Hash, now: DateTime<Utc>) -> Result<u32> {
        let commitment = self
            .commitments
            .get_mut(&period)
            .ok_or(FisherError::NoCommitment(period))?;
        let dispute = commitment.dispute.ok_or(FisherError::NotDisputed(period))?;
        if now < dispute.resolve_not_before {
            return Err(FisherError::ResolutionDelayActive {
                period,
                remaining: (dispute.resolve_not_before - now).to_std().unwrap_or_default(),
            });
        }
        commitment.root = root;
        commitment.posted_at = now;
        commitment.dispute = None;
        commitment.replacements = commitment.replacements.saturating_add(1);
        tracing::info!(
            period = %period,
            root = %commitment.root_hex(),
            replacements = commitment.replacements,
            "Commitment replaced"
        );
        Ok(commitment.replacements)
    }

    /// The commitment a claim on `period` must be proven against at `now`.
    pub fn claimable(&self, period: PeriodId, now: DateTime<Utc>) -> Result<&Commitment> {
        let commitment = self
            .commitments
            .get(&period)
            .ok_or(FisherError::NoCommitment(period))?;
        if commitment.is_disputed() {
            return Err(FisherError::CommitmentDisputed(period));
        }
        let opens_at = add_duration(commitment.posted_at, self.claims.claim_delay);
        if now < opens_at {
            return Err(FisherError::ClaimDelayActive {
                period,
                remaining: (opens_at - now).to_std().unwrap_or_default(),
            });
        }
        if now > commitment.claim_deadline {
            return Err(FisherError::ClaimDeadlinePassed(period));
        }
        Ok(commitment)
    }

    /// Earliest time the unclaimed remainder of `period` may be swept.
    #[must_use]
    pub fn sweep_opens_at(&self, period: PeriodId) -> Option<DateTime<Utc>> {
        self.commitments
            .get(&period)
            .map(|c| add_duration(c.claim_deadline, self.claims.sweep_delay))
    }

    #[must_use]
    pub fn get(&self, period: PeriodId) -> Option<&Commitment> {
        self.commitments.get(&period)
    }

    #[must_use]
    pub fn contains(&self, period: PeriodId) -> bool {
        self.commitments.contains_key(&period)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PeriodId, &Commitment)> {
        self.commitments.iter()
    }
}
