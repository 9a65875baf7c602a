//! Gas-unit cost reporting.
//!
//! Everything here is observational: nothing in the settlement path reads
//! these numbers back.

use fisher_types::CostModel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chunk_sizer::chunk_size;

/// Naive vs. batched cost of one settled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostReport {
    pub operations: u64,
    pub settle_calls: u64,
    pub era_updates: u64,
    /// `operations * naive_per_op`.
    pub naive_cost: u64,
    pub optimized_cost: u64,
    pub saved: u64,
    /// `saved / naive_cost * 100`, two decimal places.
    pub savings_percent: Decimal,
}

/// Build a report for a batch that issued `settle_calls` calls over
/// `operations` operations and bumped the era `era_updates` times.
#[must_use]
pub fn estimate(model: &CostModel, operations: u64, settle_calls: u64, era_updates: u64) -> CostReport {
    let naive_cost = operations.saturating_mul(model.naive_per_op);
    let optimized_cost = operations
        .saturating_mul(model.batched_per_op)
        .saturating_add(settle_calls.saturating_mul(model.per_settle_call))
        .saturating_add(era_updates.saturating_mul(model.per_era_update));
    let saved = naive_cost.saturating_sub(optimized_cost);

    CostReport {
        operations,
        settle_calls,
        era_updates,
        naive_cost,
        optimized_cost,
        saved,
        savings_percent: percent(saved, naive_cost),
    }
}

/// `part / whole * 100` rounded to 2 dp, zero when `whole == 0`.
#[must_use]
pub fn percent(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(2)
}

// ---------------------------------------------------------------------------
// Savings estimates
// ---------------------------------------------------------------------------

/// Fraction of working memory saved by chunking `n` operations: `1 - c/n`.
#[must_use]
pub fn memory_savings(n: usize) -> Decimal {
    if n == 0 {
        return Decimal::ZERO;
    }
    let c = chunk_size(n);
    (Decimal::ONE - Decimal::from(c as u64) / Decimal::from(n as u64)).round_dp(4)
}

/// Savings of one era bump over `participants` individual state updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraSavings {
    pub participants: u64,
    pub naive_cost: u64,
    pub era_cost: u64,
    pub saved: u64,
    pub savings_percent: Decimal,
}

#[must_use]
pub fn era_savings(model: &CostModel, participants: u64) -> EraSavings {
    let naive_cost = participants.saturating_mul(model.per_participant_update);
    let era_cost = if participants == 0 { 0 } else { model.per_era_update };
    let saved = naive_cost.saturating_sub(era_cost);
    EraSavings {
        participants,
        naive_cost,
        era_cost,
        saved,
        savings_percent: percent(saved, naive_cost),
    }
}

/// Calldata vs. blob cost of posting `bytes` of batch payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobSavings {
    pub bytes: u64,
    pub calldata_cost: u64,
    /// Per-byte blob cost plus one verification.
    pub blob_cost: u64,
    pub saved: u64,
    pub savings_percent: Decimal,
}

/// Small payloads do not amortize the verification cost; `saved` is then
/// zero rather than negative.
#[must_use]
pub fn blob_savings(model: &CostModel, bytes: u64) -> BlobSavings {
    let calldata_cost = bytes.saturating_mul(model.per_calldata_byte);
    let blob_cost = bytes
        .saturating_mul(model.per_blob_byte)
        .saturating_add(model.blob_verification);
    let saved = calldata_cost.saturating_sub(blob_cost);
    BlobSavings {
        bytes,
        calldata_cost,
        blob_cost,
        saved,
        savings_percent: percent(saved, calldata_cost),
    }
}
