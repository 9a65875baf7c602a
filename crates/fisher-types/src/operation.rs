//! Operation and batch model.
//!
//! An [`Operation`] is one payment intent. It is immutable once created and
//! travels to the settlement collaborator together with its authorization
//! token as a [`SignedOperation`]. A [`Batch`] is the ordered sequence the
//! optimizer consumes exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Address, BatchId, FisherError, OperationId, Result};

/// A single payment intent.
///
/// # Classification
/// `period_bound == true` marks an era-bound operation: it takes the **weak**
/// path, where only the era accumulator is bumped and per-participant state
/// is computed off-path. `period_bound == false` takes the **strong** path
/// through chunked settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    /// Payer.
    pub from: Address,
    /// Payee.
    pub to: Address,
    /// Amount in the smallest token unit.
    pub amount: u128,
    /// Selects the weak (era) path when `true`.
    pub period_bound: bool,
    /// Per-sender replay nonce.
    pub nonce: u64,
    pub submitted_at: DateTime<Utc>,
}

impl Operation {
    #[must_use]
    pub fn new(from: Address, to: Address, amount: u128, period_bound: bool, nonce: u64) -> Self {
        Self {
            id: OperationId::new(),
            from,
            to,
            amount,
            period_bound,
            nonce,
            submitted_at: Utc::now(),
        }
    }

    /// Construct the canonical bytes that are signed.
    ///
    /// Format: `id(16) || from(32) || to(32) || amount(16 LE) || period_bound(1) || nonce(8 LE)`
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(105);
        payload.extend_from_slice(self.id.0.as_bytes());
        payload.extend_from_slice(self.from.as_bytes());
        payload.extend_from_slice(self.to.as_bytes());
        payload.extend_from_slice(&self.amount.to_le_bytes());
        payload.push(u8::from(self.period_bound));
        payload.extend_from_slice(&self.nonce.to_le_bytes());
        payload
    }
}

/// An operation paired with its authorization token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOperation {
    pub operation: Operation,
    /// Ed25519 signature by `operation.from` over [`Operation::signing_payload`].
    pub signature: Vec<u8>,
}

impl SignedOperation {
    #[must_use]
    pub fn new(operation: Operation, signature: Vec<u8>) -> Self {
        Self {
            operation,
            signature,
        }
    }

    #[must_use]
    pub fn is_period_bound(&self) -> bool {
        self.operation.period_bound
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl SignedOperation {
    /// Create a dummy operation for unit tests. Signature is zeroed.
    pub fn dummy(amount: u128, period_bound: bool) -> Self {
        Self {
            operation: Operation::new(Address::random(), Address::random(), amount, period_bound, 0),
            signature: vec![0u8; 64],
        }
    }

    /// Create and sign an operation with a real ed25519 key.
    pub fn signed_by(
        key: &ed25519_dalek::SigningKey,
        to: Address,
        amount: u128,
        period_bound: bool,
        nonce: u64,
    ) -> Self {
        use ed25519_dalek::Signer;
        let from = Address::from_pubkey(key.verifying_key().to_bytes());
        let operation = Operation::new(from, to, amount, period_bound, nonce);
        let signature = key.sign(&operation.signing_payload()).to_bytes().to_vec();
        Self {
            operation,
            signature,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// An ordered, immutable set of signed operations handed to the optimizer.
///
/// The `batch_hash` commits to the exact ordered content, so the settlement
/// report can be traced back to the input that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub operations: Vec<SignedOperation>,
    /// SHA-256 over the ordered operations.
    pub batch_hash: [u8; 32],
    pub sealed_at: DateTime<Utc>,
}

impl Batch {
    /// Seal an ordered sequence of signed operations.
    #[must_use]
    pub fn new(id: BatchId, operations: Vec<SignedOperation>) -> Self {
        let batch_hash = Self::compute_hash(id, &operations);
        Self {
            id,
            operations,
            batch_hash,
            sealed_at: Utc::now(),
        }
    }

    /// Build a batch from parallel operation and signature lists.
    pub fn from_parts(
        id: BatchId,
        operations: Vec<Operation>,
        signatures: Vec<Vec<u8>>,
    ) -> Result<Self> {
        if operations.len() != signatures.len() {
            return Err(FisherError::LengthMismatch {
                expected: operations.len(),
                actual: signatures.len(),
            });
        }
        let signed = operations
            .into_iter()
            .zip(signatures)
            .map(|(op, sig)| SignedOperation::new(op, sig))
            .collect();
        Ok(Self::new(id, signed))
    }

    /// Deterministic hash of the batch content.
    #[must_use]
    pub fn compute_hash(id: BatchId, operations: &[SignedOperation]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"fisher:batch:v1:");
        hasher.update(id.0.to_le_bytes());
        hasher.update((operations.len() as u64).to_le_bytes());
        for signed in operations {
            hasher.update(signed.operation.signing_payload());
            hasher.update(&signed.signature);
        }
        hasher.finalize().into()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of era-bound (weak path) operations.
    #[must_use]
    pub fn period_bound_count(&self) -> usize {
        self.operations.iter().filter(|s| s.is_period_bound()).count()
    }

    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.batch_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_payload_deterministic() {
        let op = SignedOperation::dummy(100, false).operation;
        assert_eq!(op.signing_payload(), op.signing_payload());
        assert_eq!(op.signing_payload().len(), 105);
    }

    #[test]
    fn signing_payload_binds_flag_and_nonce() {
        let a = SignedOperation::dummy(100, false).operation;
        let mut b = a.clone();
        b.period_bound = true;
        assert_ne!(a.signing_payload(), b.signing_payload());
        let mut c = a.clone();
        c.nonce = 9;
        assert_ne!(a.signing_payload(), c.signing_payload());
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let ops = vec![SignedOperation::dummy(1, false).operation];
        let err = Batch::from_parts(BatchId(0), ops, vec![]).unwrap_err();
        assert!(matches!(
            err,
            FisherError::LengthMismatch {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn batch_hash_depends_on_order() {
        let a = SignedOperation::dummy(1, false);
        let b = SignedOperation::dummy(2, true);
        let h1 = Batch::new(BatchId(1), vec![a.clone(), b.clone()]).batch_hash;
        let h2 = Batch::new(BatchId(1), vec![b, a]).batch_hash;
        assert_ne!(h1, h2);
    }

    #[test]
    fn period_bound_count() {
        let batch = Batch::new(
            BatchId(0),
            vec![
                SignedOperation::dummy(1, true),
                SignedOperation::dummy(1, false),
                SignedOperation::dummy(1, true),
            ],
        );
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.period_bound_count(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let op = SignedOperation::dummy(u128::from(u64::MAX) * 4, true);
        let json = serde_json::to_string(&op).unwrap();
        let back: SignedOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
