//! Ed25519 implementation of the [`Authorizer`] capability.
//!
//! The payer's [`Address`](crate::Address) is its ed25519 verifying key, and
//! the signature covers [`Operation::signing_payload`].

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::{Authorizer, FisherError, Operation, Result};

/// Verifies operation signatures against the payer's public key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Authorizer;

impl Authorizer for Ed25519Authorizer {
    fn verify(&self, operation: &Operation, signature: &[u8]) -> Result<()> {
        let invalid = || FisherError::InvalidSignature(operation.from);

        let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| invalid())?;
        let key = VerifyingKey::from_bytes(operation.from.as_bytes()).map_err(|_| invalid())?;
        let sig = Signature::from_bytes(&sig_bytes);

        key.verify(&operation.signing_payload(), &sig)
            .map_err(|_| invalid())
    }
}

/// Accepts everything. For deployments where the settlement ledger
/// re-verifies signatures itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustingAuthorizer;

impl Authorizer for TrustingAuthorizer {
    fn verify(&self, _operation: &Operation, _signature: &[u8]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    use super::*;
    use crate::{Address, SignedOperation};

    #[test]
    fn valid_signature_verifies() {
        let key = SigningKey::generate(&mut OsRng);
        let op = SignedOperation::signed_by(&key, Address::from_tag(2), 500, false, 1);
        assert!(Ed25519Authorizer.verify(&op.operation, &op.signature).is_ok());
    }

    #[test]
    fn tampered_amount_rejected() {
        let key = SigningKey::generate(&mut OsRng);
        let mut op = SignedOperation::signed_by(&key, Address::from_tag(2), 500, false, 1);
        op.operation.amount = 501;
        let err = Ed25519Authorizer
            .verify(&op.operation, &op.signature)
            .unwrap_err();
        assert!(matches!(err, FisherError::InvalidSignature(_)));
    }

    #[test]
    fn wrong_length_signature_rejected() {
        let op = SignedOperation::dummy(1, false);
        assert!(Ed25519Authorizer.verify(&op.operation, &[1, 2, 3]).is_err());
    }

    #[test]
    fn trusting_authorizer_accepts() {
        let op = SignedOperation::dummy(1, false);
        assert!(TrustingAuthorizer.verify(&op.operation, &[]).is_ok());
    }
}
