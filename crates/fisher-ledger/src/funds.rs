//! Per-period fund conservation.
//!
//! Invariant enforced on every mutation and checkable at any time:
//! ```text
//! ∀ period: claimed + swept <= deposited
//! ```
//!
//! `claimed` is the gross (nominal) outflow. When a lossy token delivers
//! less than the nominal amount, the difference is recorded separately as
//! `precision_loss`; it is never netted against `claimed`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fisher_types::{FisherError, PeriodId, Result};
use serde::{Deserialize, Serialize};

/// Funds earmarked for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFund {
    /// Amount actually received into the ledger for this period.
    pub deposited: u128,
    /// Gross nominal amount paid out to claimants.
    pub claimed: u128,
    /// Shortfall between nominal and received on claim transfers.
    pub precision_loss: u128,
    /// Unclaimed remainder moved to the treasury.
    pub swept: u128,
    pub swept_at: Option<DateTime<Utc>>,
    pub last_deposit_at: Option<DateTime<Utc>>,
}

impl PeriodFund {
    /// `deposited - claimed - swept`.
    #[must_use]
    pub fn remaining(&self) -> u128 {
        self.deposited
            .saturating_sub(self.claimed)
            .saturating_sub(self.swept)
    }

    #[must_use]
    pub fn is_swept(&self) -> bool {
        self.swept_at.is_some()
    }
}

/// Tracks every period's fund and validates conservation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundBook {
    funds: BTreeMap<PeriodId, PeriodFund>,
}

impl FundBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deposit of `received` units into `period`.
    pub fn record_deposit(&mut self, period: PeriodId, received: u128, now: DateTime<Utc>) -> Result<()> {
        let fund = self.funds.entry(period).or_default();
        fund.deposited = fund
            .deposited
            .checked_add(received)
            .ok_or(FisherError::Overflow {
                context: "period deposit",
            })?;
        fund.last_deposit_at = Some(now);
        Ok(())
    }

    /// Phase one of a claim: count `amount` as paid out.
    pub fn reserve_claim(&mut self, period: PeriodId, amount: u128) -> Result<()> {
        let fund = self.funds.entry(period).or_default();
        let remaining = fund.remaining();
        if amount > remaining {
            return Err(FisherError::InsufficientPeriodFund {
                period,
                needed: amount,
                remaining,
            });
        }
        fund.claimed = fund.claimed.checked_add(amount).ok_or(FisherError::Overflow {
            context: "period claimed",
        })?;
        Ok(())
    }

    /// Undo [`reserve_claim`](Self::reserve_claim) after a failed transfer.
    pub fn release_claim(&mut self, period: PeriodId, amount: u128) {
        if let Some(fund) = self.funds.get_mut(&period) {
            fund.claimed = fund.claimed.saturating_sub(amount);
        }
    }

    pub fn record_precision_loss(&mut self, period: PeriodId, loss: u128) -> Result<()> {
        let fund = self.funds.entry(period).or_default();
        fund.precision_loss = fund
            .precision_loss
            .checked_add(loss)
            .ok_or(FisherError::Overflow {
                context: "precision loss",
            })?;
        Ok(())
    }

    pub fn release_precision_loss(&mut self, period: PeriodId, loss: u128) {
        if let Some(fund) = self.funds.get_mut(&period) {
            fund.precision_loss = fund.precision_loss.saturating_sub(loss);
        }
    }

    /// Mark the remainder of `period` as swept and return its amount.
    pub fn record_sweep(&mut self, period: PeriodId, now: DateTime<Utc>) -> Result<u128> {
        let fund = self.funds.entry(period).or_default();
        if fund.is_swept() {
            return Err(FisherError::AlreadySwept(period));
        }
        let amount = fund.remaining();
        fund.swept = amount;
        fund.swept_at = Some(now);
        Ok(amount)
    }

    /// Undo [`record_sweep`](Self::record_sweep) after a failed transfer.
    pub fn release_sweep(&mut self, period: PeriodId) {
        if let Some(fund) = self.funds.get_mut(&period) {
            fund.swept = 0;
            fund.swept_at = None;
        }
    }

    /// Check the invariant for one period.
    pub fn verify(&self, period: PeriodId) -> Result<()> {
        let Some(fund) = self.funds.get(&period) else {
            return Ok(());
        };
        let outflow = fund.claimed.checked_add(fund.swept);
        match outflow {
            Some(out) if out <= fund.deposited => Ok(()),
            _ => Err(FisherError::FundInvariantViolation {
                reason: format!(
                    "{period}: claimed {} + swept {} > deposited {}",
                    fund.claimed, fund.swept, fund.deposited
                ),
            }),
        }
    }

    /// Check the invariant for every period.
    pub fn verify_all(&self) -> Result<()> {
        self.funds.keys().try_for_each(|p| self.verify(*p))
    }

    #[must_use]
    pub fn get(&self, period: PeriodId) -> Option<&PeriodFund> {
        self.funds.get(&period)
    }

    #[must_use]
    pub fn remaining(&self, period: PeriodId) -> u128 {
        self.funds.get(&period).map_or(0, PeriodFund::remaining)
    }

    /// Sum of deposits across all periods.
    #[must_use]
    pub fn total_deposited(&self) -> u128 {
        self.funds.values().fold(0u128, |acc, f| acc.saturating_add(f.deposited))
    }

    /// Sum of gross claims across all periods.
    #[must_use]
    pub fn total_claimed(&self) -> u128 {
        self.funds.values().fold(0u128, |acc, f| acc.saturating_add(f.claimed))
    }

    /// Sum of precision loss across all periods.
    #[must_use]
    pub fn total_precision_loss(&self) -> u128 {
        self.funds
            .values()
            .fold(0u128, |acc, f| acc.saturating_add(f.precision_loss))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PeriodId, &PeriodFund)> {
        self.funds.iter()
    }
}
