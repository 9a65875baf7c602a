//! Identifiers used throughout Fisher.
//!
//! Participant addresses are raw ed25519 public keys; operation IDs use
//! UUIDv7 for time-ordered sorting; batches and periods are plain counters.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A participant, authority, guardian or contract address.
/// This is the raw ed25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address. Never a valid authority, guardian or treasury.
    pub const ZERO: Self = Self([0u8; 32]);

    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// Random non-zero address for tests.
    #[must_use]
    pub fn random() -> Self {
        let mut bytes: [u8; 32] = rand::random();
        bytes[0] |= 1;
        Self(bytes)
    }

    /// Deterministic address whose first byte is `tag`.
    #[must_use]
    pub fn from_tag(tag: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[0] = tag;
        bytes[31] = 0xff;
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// OperationId
// ---------------------------------------------------------------------------

/// Globally unique operation identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OperationId(pub Uuid);

impl OperationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BatchId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier assigned to each sealed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchId(pub u64);

impl BatchId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PeriodId
// ---------------------------------------------------------------------------

/// Era period counter. Starts at 0 and only ever grows by exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PeriodId(pub u64);

impl PeriodId {
    /// The successor period, or `None` on `u64` wrap.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "period:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_id_ordering() {
        let a = OperationId::new();
        let b = OperationId::new();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn period_next_increments_by_one() {
        assert_eq!(PeriodId(5).next(), Some(PeriodId(6)));
        assert_eq!(PeriodId(u64::MAX).next(), None);
    }

    #[test]
    fn batch_id_next() {
        assert_eq!(BatchId(0).next(), BatchId(1));
    }

    #[test]
    fn address_display_and_zero() {
        assert!(Address::ZERO.is_zero());
        let a = Address::random();
        assert!(!a.is_zero());
        assert!(format!("{a}").starts_with("0x"));
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn serde_roundtrips() {
        let id = OperationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: OperationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);

        let addr = Address::from_tag(7);
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
