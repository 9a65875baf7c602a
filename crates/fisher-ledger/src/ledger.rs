//! The ledger aggregate.
//!
//! [`Ledger`] owns every piece of protocol state and is the only type
//! that mutates it. Each public method is one atomic transition: it either
//! applies completely or returns an error with state unchanged.
//!
//! # Claim flow
//!
//! ```text
//! commit_claim(H) ── next block ──► reveal_claim(amount, nonce, proof)
//!                                       │
//!                                       ├─ validate (no mutation)
//!                                       ├─ phase 1: mark claimed, reserve fund
//!                                       ├─ phase 2: token transfer
//!                                       └─ slippage check ── fail ─► revert + roll back
//! ```

use chrono::{DateTime, Utc};
use fisher_types::constants::BPS_DENOMINATOR;
use fisher_types::{
    Address, CallContext, DomainConfig, EraRecorder, FeeSchedule, FisherError, PeriodId,
    ProtocolConfig, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::claim_registry::ClaimRegistry;
use crate::commit_reveal::CommitRevealBook;
use crate::commitments::{Commitment, CommitmentBook};
use crate::era::{EraLedger, PeriodSnapshot};
use crate::funds::{FundBook, PeriodFund};
use crate::governance::Governance;
use crate::halt::HaltSwitch;
use crate::merkle::{Hash, claim_leaf, verify_proof};
use crate::token::{PayoutToken, TransferReceipt};

/// Result of one finalized claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub claimant: Address,
    pub period: PeriodId,
    /// Nominal amount proven and debited from the period fund.
    pub amount: u128,
    /// Amount the claimant actually received.
    pub received: u128,
    pub precision_loss: u128,
}

/// Result of an all-or-nothing multi-period claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchClaimReceipt {
    pub claimant: Address,
    pub claims: Vec<ClaimReceipt>,
    /// Aggregate nominal transfer.
    pub sent: u128,
    pub received: u128,
}

/// The protocol state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger<T: PayoutToken> {
    config: ProtocolConfig,
    governance: Governance,
    halt: HaltSwitch,
    era: EraLedger,
    funds: FundBook,
    claims: ClaimRegistry,
    commitments: CommitmentBook,
    reveals: CommitRevealBook,
    token: T,
}

impl<T: PayoutToken> Ledger<T> {
    pub fn new(
        config: ProtocolConfig,
        authority: Address,
        guardian: Option<Address>,
        token: T,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;
        let governance = Governance::new(authority, guardian, config.recovery.clone(), now)?;
        let era = EraLedger::new(config.era.clone(), now)?;
        let commitments = CommitmentBook::new(config.claims.clone(), config.recovery.clone());
        tracing::info!(
            authority = %authority,
            guardian = ?guardian.map(|g| g.to_string()),
            chain_id = config.domain.chain_id,
            version = config.domain.version,
            "Ledger initialized"
        );
        Ok(Self {
            config,
            governance,
            halt: HaltSwitch::new(),
            era,
            funds: FundBook::new(),
            claims: ClaimRegistry::new(),
            commitments,
            reveals: CommitRevealBook::new(),
            token,
        })
    }

    fn check_operator(&self, ctx: &CallContext) -> Result<()> {
        self.governance.check_authority(ctx.caller)?;
        self.halt.check_not_halted()
    }

    // -----------------------------------------------------------------
    // Era
    // -----------------------------------------------------------------

    /// Close the current period and open the next.
    pub fn advance_period(&mut self, ctx: &CallContext) -> Result<PeriodSnapshot> {
        self.check_operator(ctx)?;
        let snapshot = self.era.advance(ctx.now)?;
        self.governance.touch(ctx.now);
        Ok(snapshot)
    }

    pub fn set_fee_schedule(&mut self, ctx: &CallContext, schedule: FeeSchedule) -> Result<()> {
        self.governance.check_authority(ctx.caller)?;
        self.era.set_fee_schedule(schedule)?;
        self.config.era.fee_schedule = schedule;
        self.governance.touch(ctx.now);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Deposits and commitments
    // -----------------------------------------------------------------

    /// Fund `period` with `amount` pulled from the caller. Returns the
    /// amount actually received, which is what the period is credited with.
    pub fn deposit_for_period(
        &mut self,
        ctx: &CallContext,
        period: PeriodId,
        amount: u128,
    ) -> Result<u128> {
        self.check_operator(ctx)?;
        if amount == 0 {
            return Err(FisherError::InvalidAmount {
                reason: "deposit must be positive".into(),
            });
        }
        if self.commitments.contains(period) {
            return Err(FisherError::RootAlreadyPosted(period));
        }

        let fund = self.funds.get(period).copied().unwrap_or_default();
        if let Some(last) = fund.last_deposit_at {
            let ready_at = fisher_types::add_duration(last, self.config.claims.min_deposit_interval);
            if ctx.now < ready_at {
                return Err(FisherError::TooFrequent {
                    period,
                    remaining: ctx.remaining_until(ready_at),
                });
            }
        }
        let cap = self.config.claims.max_deposit_per_period;
        let total = fund.deposited.checked_add(amount).ok_or(FisherError::Overflow {
            context: "period deposit",
        })?;
        if total > cap {
            return Err(FisherError::TooLarge { period, total, cap });
        }

        let received = self.token.collect(ctx.caller, amount)?;
        self.funds.record_deposit(period, received, ctx.now)?;
        self.governance.touch(ctx.now);
        if received < amount {
            tracing::warn!(
                period = %period,
                nominal = amount,
                received,
                "Deposit received less than nominal"
            );
        }
        tracing::info!(period = %period, received, "Deposit recorded");
        Ok(received)
    }

    /// Post the claim root for a closed period.
    pub fn post_commitment(&mut self, ctx: &CallContext, period: PeriodId, root: Hash) -> Result<()> {
        self.check_operator(ctx)?;
        if !self.era.is_closed(period) {
            return Err(FisherError::PeriodNotClosed {
                period,
                current: self.era.current_period(),
            });
        }
        self.commitments.post(period, root, ctx.now)?;
        self.governance.touch(ctx.now);
        Ok(())
    }

    /// Guardian challenges a commitment. Allowed while halted.
    pub fn dispute_commitment(&mut self, ctx: &CallContext, period: PeriodId) -> Result<()> {
        self.governance.check_guardian(ctx.caller)?;
        self.commitments.dispute(ctx.caller, period, ctx.now)
    }

    /// Replace a disputed commitment. Every replacement is a strike against
    /// the authority. Returns the strike count.
    pub fn replace_commitment(&mut self, ctx: &CallContext, period: PeriodId, root: Hash) -> Result<u32> {
        self.check_operator(ctx)?;
        self.commitments.replace(period, root, ctx.now)?;
        self.governance.touch(ctx.now);
        Ok(self.governance.record_strike())
    }

    /// Move the unclaimed remainder of `period` to `treasury` once the claim
    /// deadline plus the sweep delay has passed.
    pub fn sweep_period(&mut self, ctx: &CallContext, period: PeriodId, treasury: Address) -> Result<u128> {
        self.check_operator(ctx)?;
        if treasury.is_zero() {
            return Err(FisherError::ZeroAddress { role: "treasury" });
        }
        let opens_at = self
            .commitments
            .sweep_opens_at(period)
            .ok_or(FisherError::NoCommitment(period))?;
        if ctx.now < opens_at {
            return Err(FisherError::SweepTooEarly {
                period,
                remaining: ctx.remaining_until(opens_at),
            });
        }

        let amount = self.funds.record_sweep(period, ctx.now)?;
        if amount > 0 {
            if let Err(e) = self.token.transfer(treasury, amount) {
                self.funds.release_sweep(period);
                return Err(e);
            }
        }
        self.governance.touch(ctx.now);
        tracing::info!(period = %period, treasury = %treasury, amount, "Period swept");
        Ok(amount)
    }

    // -----------------------------------------------------------------
    // Claims
    // -----------------------------------------------------------------

    /// Commit to a claim. The reveal must land in a later block.
    ///
    /// Only closed periods with a posted root accept commits, and only from
    /// claimants that have not claimed the period yet.
    pub fn commit_claim(&mut self, ctx: &CallContext, period: PeriodId, hash: Hash) -> Result<()> {
        if !self.era.is_closed(period) {
            return Err(FisherError::PeriodNotClosed {
                period,
                current: self.era.current_period(),
            });
        }
        if !self.commitments.contains(period) {
            return Err(FisherError::NoCommitment(period));
        }
        self.claims.check(ctx.caller, period)?;
        self.reveals.commit(ctx.caller, period, hash, ctx.block, ctx.now);
        Ok(())
    }

    /// Reveal a committed claim and pay it out.
    pub fn reveal_claim(
        &mut self,
        ctx: &CallContext,
        period: PeriodId,
        amount: u128,
        nonce: &[u8; 32],
        proof: &[Hash],
    ) -> Result<ClaimReceipt> {
        self.reveals
            .check_reveal(&self.config.domain, ctx.caller, period, amount, nonce, ctx.block)?;
        let receipt = self.claim(ctx, period, amount, proof)?;
        self.reveals.remove(ctx.caller, period);
        Ok(receipt)
    }

    /// Reveal several committed claims on distinct periods and pay them
    /// out in one transfer. All or nothing.
    pub fn reveal_claim_batch(
        &mut self,
        ctx: &CallContext,
        periods: &[PeriodId],
        amounts: &[u128],
        nonces: &[[u8; 32]],
        proofs: &[Vec<Hash>],
    ) -> Result<BatchClaimReceipt> {
        for len in [amounts.len(), nonces.len(), proofs.len()] {
            if len != periods.len() {
                return Err(FisherError::LengthMismatch {
                    expected: periods.len(),
                    actual: len,
                });
            }
        }
        for ((period, amount), nonce) in periods.iter().zip(amounts).zip(nonces) {
            self.reveals.check_reveal(
                &self.config.domain,
                ctx.caller,
                *period,
                *amount,
                nonce,
                ctx.block,
            )?;
        }
        let receipt = self.claim_batch(ctx, periods, amounts, proofs)?;
        for period in periods {
            self.reveals.remove(ctx.caller, *period);
        }
        Ok(receipt)
    }

    /// Every precondition of a claim, checked without mutating anything.
    fn validate_claim(&self, claimant: Address, now: DateTime<Utc>, period: PeriodId, amount: u128, proof: &[Hash]) -> Result<()> {
        let claims = &self.config.claims;
        if amount == 0 {
            return Err(FisherError::InvalidAmount {
                reason: "claim must be positive".into(),
            });
        }
        if amount < claims.min_claim_amount {
            return Err(FisherError::BelowDust {
                amount,
                min: claims.min_claim_amount,
            });
        }
        if proof.len() > claims.max_proof_len {
            return Err(FisherError::ProofTooLong {
                len: proof.len(),
                max: claims.max_proof_len,
            });
        }
        if !self.era.is_closed(period) {
            return Err(FisherError::PeriodNotClosed {
                period,
                current: self.era.current_period(),
            });
        }
        let commitment = self.commitments.claimable(period, now)?;
        self.claims.check(claimant, period)?;
        let leaf = claim_leaf(&self.config.domain, &claimant, period, amount);
        if !verify_proof(leaf, proof, &commitment.root) {
            return Err(FisherError::InvalidProof { claimant, period });
        }
        let remaining = self.funds.remaining(period);
        if amount > remaining {
            return Err(FisherError::InsufficientPeriodFund {
                period,
                needed: amount,
                remaining,
            });
        }
        Ok(())
    }

    /// Shortfall of a transfer, in basis points of `nominal`, must not
    /// exceed the configured maximum.
    fn check_slippage(&self, receipt: &TransferReceipt) -> Result<()> {
        let shortfall = receipt.shortfall();
        if shortfall == 0 {
            return Ok(());
        }
        let max_bps = self.config.claims.max_slippage_bps;
        let scaled = shortfall
            .checked_mul(u128::from(BPS_DENOMINATOR))
            .ok_or(FisherError::Overflow { context: "slippage" })?;
        let allowed = receipt
            .sent
            .checked_mul(u128::from(max_bps))
            .ok_or(FisherError::Overflow { context: "slippage" })?;
        if scaled > allowed {
            return Err(FisherError::SlippageTooHigh {
                shortfall_bps: scaled / receipt.sent.max(1),
                max_bps,
            });
        }
        Ok(())
    }

    /// Phase 1 for one entry: mark claimed and reserve the fund.
    fn reserve(&mut self, claimant: Address, period: PeriodId, amount: u128) -> Result<()> {
        self.claims.mark_claimed(claimant, period)?;
        if let Err(e) = self.funds.reserve_claim(period, amount) {
            self.claims.unmark(claimant, period);
            return Err(e);
        }
        Ok(())
    }

    fn roll_back(&mut self, claimant: Address, reserved: &[(PeriodId, u128)]) {
        for (period, amount) in reserved {
            self.funds.release_claim(*period, *amount);
            self.claims.unmark(claimant, *period);
        }
    }

    /// Undo a transfer and every reservation behind it, then surface `err`.
    ///
    /// If the token refuses the revert the payout stands: the claims stay
    /// marked and reserved, the shortfall is booked as precision loss and
    /// the revert error is returned.
    fn abort_after_transfer(
        &mut self,
        claimant: Address,
        reserved: &[(PeriodId, u128)],
        receipt: &TransferReceipt,
        err: FisherError,
    ) -> FisherError {
        match self.token.revert(receipt) {
            Ok(()) => {
                self.roll_back(claimant, reserved);
                err
            }
            Err(revert_err) => {
                tracing::error!(
                    claimant = %claimant,
                    sent = receipt.sent,
                    received = receipt.received,
                    cause = %err,
                    error = %revert_err,
                    "Claim transfer could not be reverted, payout kept"
                );
                self.keep_payout(claimant, reserved, receipt);
                revert_err
            }
        }
    }

    /// Book an irreversible payout against the reservations behind it.
    fn keep_payout(&mut self, claimant: Address, reserved: &[(PeriodId, u128)], receipt: &TransferReceipt) {
        let amounts: Vec<u128> = reserved.iter().map(|(_, a)| *a).collect();
        let total = amounts.iter().fold(0u128, |acc, a| acc.saturating_add(*a));
        let shortfall = receipt.shortfall();
        let losses = Self::apportion(shortfall, &amounts, total).unwrap_or_else(|_| {
            let mut losses = vec![0; amounts.len()];
            if let Some(last) = losses.last_mut() {
                *last = shortfall;
            }
            losses
        });
        for ((period, _), loss) in reserved.iter().zip(losses) {
            if loss > 0 {
                if let Err(e) = self.funds.record_precision_loss(*period, loss) {
                    tracing::error!(period = %period, loss, error = %e, "Precision loss not recorded");
                }
            }
            self.reveals.remove(claimant, *period);
        }
    }

    fn claim(&mut self, ctx: &CallContext, period: PeriodId, amount: u128, proof: &[Hash]) -> Result<ClaimReceipt> {
        let claimant = ctx.caller;
        self.halt.check_not_halted()?;
        self.validate_claim(claimant, ctx.now, period, amount, proof)?;

        self.reserve(claimant, period, amount)?;
        let reserved = [(period, amount)];
        let receipt = match self.token.transfer(claimant, amount) {
            Ok(r) => r,
            Err(e) => {
                self.roll_back(claimant, &reserved);
                return Err(e);
            }
        };
        if let Err(e) = self.check_slippage(&receipt) {
            return Err(self.abort_after_transfer(claimant, &reserved, &receipt, e));
        }

        let loss = receipt.shortfall();
        if loss > 0 {
            if let Err(e) = self.funds.record_precision_loss(period, loss) {
                return Err(self.abort_after_transfer(claimant, &reserved, &receipt, e));
            }
            tracing::warn!(
                claimant = %claimant,
                period = %period,
                nominal = amount,
                received = receipt.received,
                "Precision loss recorded"
            );
        }
        tracing::debug!(claimant = %claimant, period = %period, amount, "Claim paid");
        Ok(ClaimReceipt {
            claimant,
            period,
            amount,
            received: receipt.received,
            precision_loss: loss,
        })
    }

    fn check_claim_batch(&self, periods: &[PeriodId], amounts: &[u128], proofs: &[Vec<Hash>]) -> Result<u128> {
        for len in [amounts.len(), proofs.len()] {
            if len != periods.len() {
                return Err(FisherError::LengthMismatch {
                    expected: periods.len(),
                    actual: len,
                });
            }
        }
        if periods.is_empty() {
            return Err(FisherError::InvalidClaimBatch {
                reason: "empty batch".into(),
            });
        }
        let max = self.config.claims.max_claim_batch;
        if periods.len() > max {
            return Err(FisherError::ClaimBatchTooLarge {
                len: periods.len(),
                max,
            });
        }
        let mut seen = std::collections::HashSet::with_capacity(periods.len());
        for period in periods {
            if !seen.insert(*period) {
                return Err(FisherError::InvalidClaimBatch {
                    reason: format!("duplicate {period}"),
                });
            }
        }
        amounts.iter().try_fold(0u128, |acc, a| {
            acc.checked_add(*a).ok_or(FisherError::Overflow {
                context: "claim batch total",
            })
        })
    }

    /// Split `shortfall` across entries in proportion to their amounts; the
    /// last entry absorbs the rounding remainder.
    fn apportion(shortfall: u128, amounts: &[u128], total: u128) -> Result<Vec<u128>> {
        let mut losses = Vec::with_capacity(amounts.len());
        let mut assigned = 0u128;
        for (i, amount) in amounts.iter().enumerate() {
            let loss = if i + 1 == amounts.len() {
                shortfall.saturating_sub(assigned)
            } else {
                shortfall
                    .checked_mul(*amount)
                    .ok_or(FisherError::Overflow {
                        context: "claim batch apportion",
                    })?
                    / total.max(1)
            };
            assigned = assigned.saturating_add(loss);
            losses.push(loss);
        }
        Ok(losses)
    }

    fn claim_batch(
        &mut self,
        ctx: &CallContext,
        periods: &[PeriodId],
        amounts: &[u128],
        proofs: &[Vec<Hash>],
    ) -> Result<BatchClaimReceipt> {
        let claimant = ctx.caller;
        self.halt.check_not_halted()?;
        let total = self.check_claim_batch(periods, amounts, proofs)?;
        for ((period, amount), proof) in periods.iter().zip(amounts).zip(proofs) {
            self.validate_claim(claimant, ctx.now, *period, *amount, proof)?;
        }

        let mut reserved: Vec<(PeriodId, u128)> = Vec::with_capacity(periods.len());
        for (period, amount) in periods.iter().zip(amounts) {
            if let Err(e) = self.reserve(claimant, *period, *amount) {
                self.roll_back(claimant, &reserved);
                return Err(e);
            }
            reserved.push((*period, *amount));
        }

        let receipt = match self.token.transfer(claimant, total) {
            Ok(r) => r,
            Err(e) => {
                self.roll_back(claimant, &reserved);
                return Err(e);
            }
        };
        if let Err(e) = self.check_slippage(&receipt) {
            return Err(self.abort_after_transfer(claimant, &reserved, &receipt, e));
        }
        let losses = match Self::apportion(receipt.shortfall(), amounts, total) {
            Ok(l) => l,
            Err(e) => return Err(self.abort_after_transfer(claimant, &reserved, &receipt, e)),
        };

        let mut claims = Vec::with_capacity(periods.len());
        for ((period, amount), loss) in periods.iter().zip(amounts).zip(&losses) {
            if *loss > 0 {
                if let Err(e) = self.funds.record_precision_loss(*period, *loss) {
                    for (p, l) in periods.iter().zip(&losses).take(claims.len()) {
                        self.funds.release_precision_loss(*p, *l);
                    }
                    return Err(self.abort_after_transfer(claimant, &reserved, &receipt, e));
                }
            }
            claims.push(ClaimReceipt {
                claimant,
                period: *period,
                amount: *amount,
                received: amount.saturating_sub(*loss),
                precision_loss: *loss,
            });
        }

        if receipt.shortfall() > 0 {
            tracing::warn!(
                claimant = %claimant,
                periods = periods.len(),
                nominal = total,
                received = receipt.received,
                "Precision loss recorded"
            );
        }
        tracing::debug!(claimant = %claimant, periods = periods.len(), total, "Claim batch paid");
        Ok(BatchClaimReceipt {
            claimant,
            claims,
            sent: receipt.sent,
            received: receipt.received,
        })
    }

    // -----------------------------------------------------------------
    // Halt and governance
    // -----------------------------------------------------------------

    pub fn halt(&mut self, ctx: &CallContext) -> Result<()> {
        self.halt.halt(ctx, &self.governance)?;
        self.governance.touch(ctx.now);
        Ok(())
    }

    pub fn unhalt(&mut self, ctx: &CallContext) -> Result<()> {
        self.halt.unhalt(ctx, &self.governance)?;
        if !self.governance.guardian_ever_configured() {
            self.governance.touch(ctx.now);
        }
        Ok(())
    }

    pub fn set_guardian(&mut self, ctx: &CallContext, guardian: Address) -> Result<()> {
        self.governance.set_guardian(ctx, guardian)
    }

    pub fn propose_authority(&mut self, ctx: &CallContext, new_authority: Address) -> Result<()> {
        self.governance.propose_authority(ctx, new_authority)
    }

    pub fn accept_authority(&mut self, ctx: &CallContext) -> Result<()> {
        self.governance.accept_authority(ctx)
    }

    pub fn request_strike_reset(&mut self, ctx: &CallContext) -> Result<()> {
        self.governance.request_strike_reset(ctx)
    }

    pub fn execute_strike_reset(&mut self, ctx: &CallContext) -> Result<()> {
        self.governance.execute_strike_reset(ctx)
    }

    pub fn designate_recovery(&mut self, ctx: &CallContext, address: Address) -> Result<()> {
        self.governance.designate_recovery(ctx, address)
    }

    pub fn claim_recovery(&mut self, ctx: &CallContext) -> Result<()> {
        self.governance.claim_recovery(ctx)
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    /// `claimed + swept <= deposited` for every period.
    pub fn check_invariants(&self) -> Result<()> {
        self.funds.verify_all()
    }

    #[must_use]
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    #[must_use]
    pub fn domain(&self) -> &DomainConfig {
        &self.config.domain
    }

    #[must_use]
    pub fn governance(&self) -> &Governance {
        &self.governance
    }

    #[must_use]
    pub fn era(&self) -> &EraLedger {
        &self.era
    }

    #[must_use]
    pub fn funds(&self) -> &FundBook {
        &self.funds
    }

    #[must_use]
    pub fn current_period(&self) -> PeriodId {
        self.era.current_period()
    }

    #[must_use]
    pub fn period_fund(&self, period: PeriodId) -> PeriodFund {
        self.funds.get(period).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn remaining(&self, period: PeriodId) -> u128 {
        self.funds.remaining(period)
    }

    #[must_use]
    pub fn has_claimed(&self, claimant: Address, period: PeriodId) -> bool {
        self.claims.has_claimed(claimant, period)
    }

    #[must_use]
    pub fn commitment(&self, period: PeriodId) -> Option<&Commitment> {
        self.commitments.get(period)
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halt.is_halted()
    }

    pub fn fees_for_period(&self, period: PeriodId) -> Result<Decimal> {
        self.era.fees_for_period(period)
    }

    pub fn batch_fees(&self, count: u64) -> Result<Decimal> {
        self.era.batch_fees(count)
    }

    #[must_use]
    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }
}

impl<T: PayoutToken> EraRecorder for Ledger<T> {
    fn record_operations(&mut self, count: u64) -> Result<()> {
        self.era.record_operations(count)
    }
}
