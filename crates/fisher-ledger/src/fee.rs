//! Closed-form per-period fee.
//!
//! ```text
//! Growth: fee(p) = base * (1 + rate)^p
//! Decay:  fee(p) = base * (1 - rate)^p
//! ```
//!
//! The power is computed by square-and-multiply in `O(log p)` checked
//! `Decimal` multiplications, so any period can be priced without
//! iterating over its predecessors.

use fisher_types::{FeeCurve, FeeSchedule, FisherError, PeriodId, Result};
use rust_decimal::Decimal;

fn overflow() -> FisherError {
    FisherError::Overflow {
        context: "period fee",
    }
}

/// `base^exp` by repeated squaring with checked multiplication.
pub fn checked_pow(base: Decimal, mut exp: u64) -> Result<Decimal> {
    let mut result = Decimal::ONE;
    let mut square = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(square).ok_or_else(overflow)?;
        }
        exp >>= 1;
        if exp > 0 {
            square = square.checked_mul(square).ok_or_else(overflow)?;
        }
    }
    Ok(result)
}

/// Per-operation fee for `period`.
pub fn period_fee(schedule: &FeeSchedule, period: PeriodId) -> Result<Decimal> {
    let factor = match schedule.curve {
        FeeCurve::Growth => Decimal::ONE.checked_add(schedule.rate),
        FeeCurve::Decay => Decimal::ONE.checked_sub(schedule.rate),
    }
    .ok_or_else(overflow)?;
    let multiplier = checked_pow(factor, period.0)?;
    schedule.base_fee.checked_mul(multiplier).ok_or_else(overflow)
}

/// `count * fee`.
pub fn total_fee(fee: Decimal, count: u64) -> Result<Decimal> {
    fee.checked_mul(Decimal::from(count)).ok_or_else(overflow)
}
