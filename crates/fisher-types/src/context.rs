//! Call context passed into every state-mutating ledger operation.
//!
//! The ledger never reads the wall clock itself; the caller supplies the
//! current time and block height so transitions are deterministic and
//! testable.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Address;

/// Who is calling, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The caller's address.
    pub caller: Address,
    /// Current timestamp.
    pub now: DateTime<Utc>,
    /// Current block height. Commit/reveal requires strictly increasing blocks.
    pub block: u64,
}

impl CallContext {
    #[must_use]
    pub fn new(caller: Address, now: DateTime<Utc>, block: u64) -> Self {
        Self { caller, now, block }
    }

    /// Same time and block, different caller.
    #[must_use]
    pub fn as_caller(self, caller: Address) -> Self {
        Self { caller, ..self }
    }

    /// Time elapsed since `then`, clamped to zero if `then` is in the future.
    #[must_use]
    pub fn elapsed_since(&self, then: DateTime<Utc>) -> Duration {
        (self.now - then).to_std().unwrap_or_default()
    }

    /// Time remaining until `deadline`, zero once it has passed.
    #[must_use]
    pub fn remaining_until(&self, deadline: DateTime<Utc>) -> Duration {
        (deadline - self.now).to_std().unwrap_or_default()
    }
}

/// `at + d`, saturating at the maximum representable timestamp.
#[must_use]
pub fn add_duration(at: DateTime<Utc>, d: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(d)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(any(test, feature = "test-helpers"))]
impl CallContext {
    /// Context at `secs` seconds after a fixed origin, block = `secs`.
    #[must_use]
    pub fn at(caller: Address, secs: i64) -> Self {
        let origin = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        Self {
            caller,
            now: origin + chrono::Duration::seconds(secs),
            block: u64::try_from(secs).unwrap_or(0),
        }
    }

    /// Move the clock forward and bump the block height by one.
    #[must_use]
    pub fn advance(self, d: Duration) -> Self {
        Self {
            now: add_duration(self.now, d),
            block: self.block + 1,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_clamps_future_to_zero() {
        let ctx = CallContext::at(Address::from_tag(1), 100);
        let later = ctx.now + chrono::Duration::seconds(50);
        assert_eq!(ctx.elapsed_since(later), Duration::ZERO);
        let earlier = ctx.now - chrono::Duration::seconds(50);
        assert_eq!(ctx.elapsed_since(earlier), Duration::from_secs(50));
    }

    #[test]
    fn remaining_until_deadline() {
        let ctx = CallContext::at(Address::from_tag(1), 0);
        let deadline = add_duration(ctx.now, Duration::from_secs(30));
        assert_eq!(ctx.remaining_until(deadline), Duration::from_secs(30));
        let later = ctx.advance(Duration::from_secs(60));
        assert_eq!(later.remaining_until(deadline), Duration::ZERO);
        assert_eq!(later.block, ctx.block + 1);
    }

    #[test]
    fn as_caller_keeps_time() {
        let ctx = CallContext::at(Address::from_tag(1), 10);
        let other = ctx.as_caller(Address::from_tag(2));
        assert_eq!(other.now, ctx.now);
        assert_eq!(other.caller, Address::from_tag(2));
    }
}
