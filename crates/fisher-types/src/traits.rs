//! Collaborator contracts.
//!
//! The optimizer talks to the outside world only through these traits:
//! the settlement ledger that actually moves value, the era accumulator
//! that counts weak-path operations, and the authorization check applied
//! at submission time.

use crate::{Operation, Result, SignedOperation};

/// The external settlement ledger.
///
/// Given a list of signed operations, returns one success flag per
/// operation, index-aligned with the input. An `Err` means the whole call
/// failed and nothing was applied.
pub trait SettlementClient {
    fn settle(&mut self, operations: &[SignedOperation]) -> Result<Vec<bool>>;
}

/// Sink for weak-path operation counts.
pub trait EraRecorder {
    /// Add `count` operations to the current period's accumulator.
    fn record_operations(&mut self, count: u64) -> Result<()>;
}

/// Capability: "signature S authorizes operation P".
pub trait Authorizer {
    fn verify(&self, operation: &Operation, signature: &[u8]) -> Result<()>;
}

impl<T: SettlementClient + ?Sized> SettlementClient for &mut T {
    fn settle(&mut self, operations: &[SignedOperation]) -> Result<Vec<bool>> {
        (**self).settle(operations)
    }
}

impl<T: EraRecorder + ?Sized> EraRecorder for &mut T {
    fn record_operations(&mut self, count: u64) -> Result<()> {
        (**self).record_operations(count)
    }
}
