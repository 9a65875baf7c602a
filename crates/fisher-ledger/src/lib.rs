//! # fisher-ledger
//!
//! **Stateful protocol plane**: era accounting, per-period funds, claim
//! finalization, commitments, disputes and recovery.
//!
//! ## Architecture
//!
//! The [`Ledger`] aggregate owns all state and exposes one method per
//! protocol transition. Every transition takes a
//! [`CallContext`](fisher_types::CallContext) carrying the caller, the
//! time and the block height.
//!
//! 1. The authority advances periods and funds them
//! 2. The optimizer records weak-path operations into the era accumulator
//! 3. The authority posts a merkle root of the closed period's claims
//! 4. The guardian may dispute the root inside the objection window
//! 5. Claimants commit, then reveal with a proof, and are paid out
//! 6. After the deadline the remainder is swept to a treasury
//!
//! ## Invariant
//!
//! For every period, `claimed + swept <= deposited`.

pub mod claim_registry;
pub mod commit_reveal;
pub mod commitments;
pub mod era;
pub mod fee;
pub mod funds;
pub mod governance;
pub mod halt;
pub mod ledger;
pub mod merkle;
pub mod token;

pub use claim_registry::ClaimRegistry;
pub use commit_reveal::{ClaimCommit, CommitRevealBook, claim_commitment};
pub use commitments::{Commitment, CommitmentBook, Dispute};
pub use era::{EraLedger, PeriodSnapshot};
pub use fee::{period_fee, total_fee};
pub use funds::{FundBook, PeriodFund};
pub use governance::{Governance, RecoveryDesignation};
pub use halt::HaltSwitch;
pub use ledger::{BatchClaimReceipt, ClaimReceipt, Ledger};
#[cfg(any(test, feature = "test-helpers"))]
pub use merkle::ClaimTree;
pub use merkle::{Hash, claim_leaf, compute_root, hash_pair, verify_proof};
pub use token::{InMemoryToken, PayoutToken, TransferReceipt};
