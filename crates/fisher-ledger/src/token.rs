//! Payout token contract.
//!
//! The ledger holds deposited funds in a [`PayoutToken`] pool and pays
//! claims out of it. Tokens may deliver less than the nominal amount
//! (fee-on-transfer); callers always act on the amount actually received.

use std::collections::HashMap;

use fisher_types::constants::BPS_DENOMINATOR;
use fisher_types::{Address, FisherError, Result};
use serde::{Deserialize, Serialize};

/// Outcome of one outbound transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub to: Address,
    /// Nominal amount debited from the pool.
    pub sent: u128,
    /// Amount credited to the recipient.
    pub received: u128,
}

impl TransferReceipt {
    /// `sent - received`.
    #[must_use]
    pub fn shortfall(&self) -> u128 {
        self.sent.saturating_sub(self.received)
    }
}

/// Token movements the ledger depends on.
pub trait PayoutToken {
    /// Pull `amount` from `from` into the pool. Returns the amount the pool
    /// actually received.
    fn collect(&mut self, from: Address, amount: u128) -> Result<u128>;

    /// Pay `amount` from the pool to `to`.
    fn transfer(&mut self, to: Address, amount: u128) -> Result<TransferReceipt>;

    /// Undo a transfer made earlier in the same failed operation.
    fn revert(&mut self, receipt: &TransferReceipt) -> Result<()>;
}

// ---------------------------------------------------------------------------
// InMemoryToken
// ---------------------------------------------------------------------------

/// Balance-map token with an optional transfer fee in basis points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryToken {
    balances: HashMap<Address, u128>,
    pool: u128,
    fee_bps: u32,
    burned: u128,
    failing: bool,
}

fn fee_of(amount: u128, fee_bps: u32) -> u128 {
    let bps = u128::from(fee_bps);
    let denom = u128::from(BPS_DENOMINATOR);
    (amount / denom) * bps + (amount % denom) * bps / denom
}

fn transfer_failed(reason: impl Into<String>) -> FisherError {
    FisherError::TransferFailed {
        reason: reason.into(),
    }
}

impl InMemoryToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that skims `fee_bps` basis points off every movement.
    #[must_use]
    pub fn with_fee_bps(fee_bps: u32) -> Self {
        Self {
            fee_bps: fee_bps.min(BPS_DENOMINATOR),
            ..Self::default()
        }
    }

    pub fn mint(&mut self, to: Address, amount: u128) -> Result<()> {
        let balance = self.balances.entry(to).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(FisherError::Overflow { context: "token mint" })?;
        Ok(())
    }

    pub fn set_fee_bps(&mut self, fee_bps: u32) {
        self.fee_bps = fee_bps.min(BPS_DENOMINATOR);
    }

    /// Make every subsequent movement fail until cleared.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    #[must_use]
    pub fn balance_of(&self, who: Address) -> u128 {
        self.balances.get(&who).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn pool_balance(&self) -> u128 {
        self.pool
    }

    /// Total skimmed by transfer fees.
    #[must_use]
    pub fn burned(&self) -> u128 {
        self.burned
    }

    fn check_live(&self) -> Result<()> {
        if self.failing {
            return Err(transfer_failed("token paused"));
        }
        Ok(())
    }
}

impl PayoutToken for InMemoryToken {
    fn collect(&mut self, from: Address, amount: u128) -> Result<u128> {
        self.check_live()?;
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(transfer_failed(format!(
                "{from} holds {balance}, needs {amount}"
            )));
        }
        let fee = fee_of(amount, self.fee_bps);
        let received = amount - fee;
        let pool = self
            .pool
            .checked_add(received)
            .ok_or(FisherError::Overflow { context: "token pool" })?;
        self.balances.insert(from, balance - amount);
        self.pool = pool;
        self.burned = self.burned.saturating_add(fee);
        Ok(received)
    }

    fn transfer(&mut self, to: Address, amount: u128) -> Result<TransferReceipt> {
        self.check_live()?;
        if self.pool < amount {
            return Err(transfer_failed(format!(
                "pool holds {}, needs {amount}",
                self.pool
            )));
        }
        let fee = fee_of(amount, self.fee_bps);
        let received = amount - fee;
        let balance = self
            .balance_of(to)
            .checked_add(received)
            .ok_or(FisherError::Overflow { context: "token balance" })?;
        self.pool -= amount;
        self.balances.insert(to, balance);
        self.burned = self.burned.saturating_add(fee);
        Ok(TransferReceipt {
            to,
            sent: amount,
            received,
        })
    }

    fn revert(&mut self, receipt: &TransferReceipt) -> Result<()> {
        let balance = self.balance_of(receipt.to);
        if balance < receipt.received {
            return Err(transfer_failed(format!(
                "cannot revert: {} holds {balance}, received {}",
                receipt.to, receipt.received
            )));
        }
        let pool = self
            .pool
            .checked_add(receipt.sent)
            .ok_or(FisherError::Overflow { context: "token pool" })?;
        self.balances.insert(receipt.to, balance - receipt.received);
        self.pool = pool;
        self.burned = self.burned.saturating_sub(receipt.shortfall());
        Ok(())
    }
}

impl<T: PayoutToken + ?Sized> PayoutToken for &mut T {
    fn collect(&mut self, from: Address, amount: u128) -> Result<u128> {
        (**self).collect(from, amount)
    }

    fn transfer(&mut self, to: Address, amount: u128) -> Result<TransferReceipt> {
        (**self).transfer(to, amount)
    }

    fn revert(&mut self, receipt: &TransferReceipt) -> Result<()> {
        (**self).revert(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_roundtrip() {
        let mut token = InMemoryToken::new();
        let a = Address::from_tag(1);
        let b = Address::from_tag(2);
        token.mint(a, 1_000).unwrap();
        assert_eq!(token.collect(a, 600).unwrap(), 600);
        let r = token.transfer(b, 100).unwrap();
        assert_eq!(r.received, 100);
        assert_eq!(token.pool_balance(), 500);
        assert_eq!(token.balance_of(b), 100);
    }

    #[test]
    fn fee_on_transfer_delivers_less() {
        let mut token = InMemoryToken::with_fee_bps(50);
        let a = Address::from_tag(1);
        token.mint(a, 10_000).unwrap();
        assert_eq!(token.collect(a, 10_000).unwrap(), 9_950);
        let r = token.transfer(Address::from_tag(2), 1_000).unwrap();
        assert_eq!(r.received, 995);
        assert_eq!(r.shortfall(), 5);
        assert_eq!(token.burned(), 55);
    }

    #[test]
    fn revert_restores_pool() {
        let mut token = InMemoryToken::with_fee_bps(100);
        let a = Address::from_tag(1);
        token.mint(a, 1_000).unwrap();
        token.collect(a, 1_000).unwrap();
        let before = token.pool_balance();
        let r = token.transfer(Address::from_tag(2), 500).unwrap();
        token.revert(&r).unwrap();
        assert_eq!(token.pool_balance(), before);
        assert_eq!(token.balance_of(Address::from_tag(2)), 0);
        assert_eq!(token.burned(), 10);
    }

    #[test]
    fn insufficient_pool_fails() {
        let mut token = InMemoryToken::new();
        let err = token.transfer(Address::from_tag(2), 1).unwrap_err();
        assert!(matches!(err, FisherError::TransferFailed { .. }));
    }

    #[test]
    fn paused_token_fails() {
        let mut token = InMemoryToken::new();
        token.mint(Address::from_tag(1), 10).unwrap();
        token.set_failing(true);
        assert!(token.collect(Address::from_tag(1), 10).is_err());
        assert_eq!(token.balance_of(Address::from_tag(1)), 10);
    }

    #[test]
    fn fee_rounds_down_on_huge_amounts() {
        assert_eq!(fee_of(u128::MAX, 10_000), u128::MAX);
        assert_eq!(fee_of(19_999, 1), 1);
    }
}
