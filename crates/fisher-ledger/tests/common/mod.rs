//! Shared harness for ledger integration tests.

#![allow(dead_code)]

use std::time::Duration;

use fisher_ledger::{
    ClaimReceipt, Hash, InMemoryToken, Ledger, claim_commitment, claim_leaf, hash_pair,
};
use fisher_types::{Address, CallContext, DomainConfig, PeriodId, ProtocolConfig, Result};

pub const BLOCK: Duration = Duration::from_secs(12);
pub const HOUR: Duration = Duration::from_secs(3_600);
pub const DAY: Duration = Duration::from_secs(86_400);

/// A ledger plus a moving clock.
pub struct Harness {
    pub ledger: Ledger<InMemoryToken>,
    pub authority: Address,
    pub guardian: Address,
    pub now: CallContext,
}

impl Harness {
    pub fn new(fee_bps: u32) -> Self {
        Self::with_config(ProtocolConfig::default(), fee_bps)
    }

    pub fn with_config(config: ProtocolConfig, fee_bps: u32) -> Self {
        let authority = Address::from_tag(1);
        let guardian = Address::from_tag(2);
        let now = CallContext::at(authority, 0);
        let mut token = InMemoryToken::with_fee_bps(fee_bps);
        token.mint(authority, u128::from(u64::MAX)).unwrap();
        let ledger = Ledger::new(config, authority, Some(guardian), token, now.now).unwrap();
        Self {
            ledger,
            authority,
            guardian,
            now,
        }
    }

    pub fn wait(&mut self, d: Duration) {
        self.now = self.now.advance(d);
    }

    /// Current time, acting as `who`.
    pub fn as_(&self, who: Address) -> CallContext {
        self.now.as_caller(who)
    }

    pub fn auth(&self) -> CallContext {
        self.as_(self.authority)
    }

    pub fn guard(&self) -> CallContext {
        self.as_(self.guardian)
    }

    /// Commit now, reveal one block later.
    pub fn claim(&mut self, who: Address, period: PeriodId, amount: u128, proof: &[Hash]) -> Result<ClaimReceipt> {
        let nonce: [u8; 32] = rand::random();
        let ctx = self.as_(who);
        let h = claim_commitment(self.ledger.domain(), &who, period, amount, &nonce);
        self.ledger.commit_claim(&ctx, period, h)?;
        self.wait(BLOCK);
        let ctx = self.as_(who);
        self.ledger.reveal_claim(&ctx, period, amount, &nonce, proof)
    }
}

/// Root and per-leaf proofs for a two-claimant period.
pub fn two_leaf_tree(
    domain: &DomainConfig,
    period: PeriodId,
    a: (Address, u128),
    b: (Address, u128),
) -> (Hash, Vec<Hash>, Vec<Hash>) {
    let la = claim_leaf(domain, &a.0, period, a.1);
    let lb = claim_leaf(domain, &b.0, period, b.1);
    (hash_pair(&la, &lb), vec![lb], vec![la])
}

/// Sum of every period's remaining fund.
pub fn total_remaining(ledger: &Ledger<InMemoryToken>) -> u128 {
    ledger.funds().iter().map(|(_, f)| f.remaining()).sum()
}
