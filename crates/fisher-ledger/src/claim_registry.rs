//! At-most-once claim registry.
//!
//! Each (claimant, period) pair can be marked exactly once. Attempting to
//! mark it again returns [`FisherError::AlreadyClaimed`]. Entries are never
//! evicted: a claimed flag is permanent.

use std::collections::HashSet;

use fisher_types::{Address, FisherError, PeriodId, Result};
use serde::{Deserialize, Serialize};

/// Per-(participant, period) "has claimed" flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimRegistry {
    claimed: HashSet<(Address, PeriodId)>,
}

impl ClaimRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if `claimant` already claimed `period`, without marking.
    pub fn check(&self, claimant: Address, period: PeriodId) -> Result<()> {
        if self.claimed.contains(&(claimant, period)) {
            return Err(FisherError::AlreadyClaimed { claimant, period });
        }
        Ok(())
    }

    /// Mark `claimant` as having claimed `period`.
    pub fn mark_claimed(&mut self, claimant: Address, period: PeriodId) -> Result<()> {
        if !self.claimed.insert((claimant, period)) {
            return Err(FisherError::AlreadyClaimed { claimant, period });
        }
        Ok(())
    }

    /// Undo a mark made earlier in the same failed claim.
    pub(crate) fn unmark(&mut self, claimant: Address, period: PeriodId) {
        self.claimed.remove(&(claimant, period));
    }

    #[must_use]
    pub fn has_claimed(&self, claimant: Address, period: PeriodId) -> bool {
        self.claimed.contains(&(claimant, period))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
