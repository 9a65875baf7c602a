//! Error types for the Fisher batch settlement optimizer.
//!
//! All errors use the `FSH_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by class:
//! - 1xx: Input validation (rejected before any mutation, fix and resubmit)
//! - 2xx: Temporal / ordering (rejected, recoverable by waiting)
//! - 3xx: Authorization (recoverable only through dispute/recovery)
//! - 4xx: Accounting invariants (never truncated or partially applied)
//! - 5xx: External collaborator failures (whole batch fails, resubmit)
//! - 9xx: General / internal errors

use std::time::Duration;

use thiserror::Error;

use crate::{Address, PeriodId};

/// Central error enum for all Fisher operations.
#[derive(Debug, Error)]
pub enum FisherError {
    // =================================================================
    // Input Validation (1xx)
    // =================================================================
    /// Two parallel inputs that must be index-aligned have different lengths.
    #[error("FSH_ERR_100: Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Batch is smaller than the configured minimum.
    #[error("FSH_ERR_101: Batch too small: {size} < minimum {min}")]
    BatchTooSmall { size: usize, min: usize },

    /// Batch is larger than the configured maximum.
    #[error("FSH_ERR_102: Batch too large: {size} > maximum {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Amount is below the dust threshold.
    #[error("FSH_ERR_103: Amount {amount} below minimum {min}")]
    BelowDust { amount: u128, min: u128 },

    /// Merkle proof has more siblings than allowed.
    #[error("FSH_ERR_104: Proof too long: {len} > maximum {max}")]
    ProofTooLong { len: usize, max: usize },

    /// Merkle proof does not authenticate the claimed leaf.
    #[error("FSH_ERR_105: Invalid claim proof for {claimant} in {period}")]
    InvalidProof { claimant: Address, period: PeriodId },

    /// Zero or otherwise meaningless amount.
    #[error("FSH_ERR_106: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Operation authorization token did not verify.
    #[error("FSH_ERR_107: Invalid authorization for operation from {0}")]
    InvalidSignature(Address),

    /// Revealed claim does not match the stored commit hash.
    #[error("FSH_ERR_108: Reveal does not match claim commitment for {period}")]
    RevealMismatch { period: PeriodId },

    /// No claim commitment exists for this (claimant, period).
    #[error("FSH_ERR_109: No claim commitment for {claimant} in {period}")]
    NoClaimCommit { claimant: Address, period: PeriodId },

    /// A batch claim listed the same period twice or listed nothing.
    #[error("FSH_ERR_110: Invalid claim batch: {reason}")]
    InvalidClaimBatch { reason: String },

    /// A batch claim exceeds the configured length bound.
    #[error("FSH_ERR_111: Claim batch too large: {len} > maximum {max}")]
    ClaimBatchTooLarge { len: usize, max: usize },

    /// Address argument is the zero address.
    #[error("FSH_ERR_112: Zero address not allowed for {role}")]
    ZeroAddress { role: &'static str },

    /// The pending queue is at capacity.
    #[error("FSH_ERR_113: Pending queue full: capacity {capacity}")]
    QueueFull { capacity: usize },

    // =================================================================
    // Temporal / Ordering (2xx)
    // =================================================================
    /// Minimum period duration has not elapsed since the last advance.
    #[error("FSH_ERR_200: Too soon to advance: {elapsed:?} elapsed, minimum {min:?}")]
    TooSoon { elapsed: Duration, min: Duration },

    /// Maximum period duration was exceeded and the policy blocks the advance.
    #[error("FSH_ERR_201: Period overdue: {elapsed:?} elapsed, maximum {max:?}")]
    Overdue { elapsed: Duration, max: Duration },

    /// Period is still open (or in the future).
    #[error("FSH_ERR_202: {period} is not closed (current {current})")]
    PeriodNotClosed { period: PeriodId, current: PeriodId },

    /// Claim delay after commitment posting has not elapsed.
    #[error("FSH_ERR_203: Claim delay active for {period}: {remaining:?} remaining")]
    ClaimDelayActive { period: PeriodId, remaining: Duration },

    /// Claim deadline for the period has passed.
    #[error("FSH_ERR_204: Claim deadline passed for {0}")]
    ClaimDeadlinePassed(PeriodId),

    /// Commitment objection window is still open.
    #[error("FSH_ERR_205: Dispute period active for {period}: {remaining:?} remaining")]
    DisputePeriodActive { period: PeriodId, remaining: Duration },

    /// Commitment objection window has closed.
    #[error("FSH_ERR_206: Dispute window closed for {0}")]
    DisputeWindowClosed(PeriodId),

    /// Dispute resolution delay has not elapsed.
    #[error("FSH_ERR_207: Resolution delay active for {period}: {remaining:?} remaining")]
    ResolutionDelayActive { period: PeriodId, remaining: Duration },

    /// Guardian is still in its dispute cooldown.
    #[error("FSH_ERR_208: Dispute cooldown active: {remaining:?} remaining")]
    DisputeCooldown { remaining: Duration },

    /// Deposits into the same period arrived faster than allowed.
    #[error("FSH_ERR_209: Deposit too frequent for {period}: {remaining:?} remaining")]
    TooFrequent { period: PeriodId, remaining: Duration },

    /// Reveal in the same block as its commit.
    #[error("FSH_ERR_210: Reveal too early: committed at block {committed_at}, now {block}")]
    RevealTooEarly { committed_at: u64, block: u64 },

    /// Sweep attempted before claim deadline plus sweep delay.
    #[error("FSH_ERR_211: Sweep not yet allowed for {period}: {remaining:?} remaining")]
    SweepTooEarly { period: PeriodId, remaining: Duration },

    /// Liveness recovery window has not elapsed.
    #[error("FSH_ERR_212: Recovery not ready: {remaining:?} remaining")]
    RecoveryNotReady { remaining: Duration },

    /// Strike reset delay has not elapsed, or no reset was requested.
    #[error("FSH_ERR_213: Strike reset not ready: {reason}")]
    StrikeResetNotReady { reason: String },

    // =================================================================
    // Authorization (3xx)
    // =================================================================
    /// Caller is not the authority.
    #[error("FSH_ERR_300: Caller {0} is not the authority")]
    NotAuthority(Address),

    /// Caller is not the guardian (or no guardian is configured).
    #[error("FSH_ERR_301: Caller {0} is not the guardian")]
    NotGuardian(Address),

    /// Authority reached the maximum strike count and is revoked.
    #[error("FSH_ERR_302: Authority revoked after {strikes} strikes")]
    AuthorityRevoked { strikes: u32 },

    /// Caller is not the designated recovery address.
    #[error("FSH_ERR_303: Caller {0} is not the designated recovery address")]
    NotRecovery(Address),

    /// Caller is not the pending authority.
    #[error("FSH_ERR_304: Caller {0} is not the pending authority")]
    NotPendingAuthority(Address),

    /// Emergency halt is active.
    #[error("FSH_ERR_305: Emergency halt active")]
    Halted,

    // =================================================================
    // Accounting Invariants (4xx)
    // =================================================================
    /// Remaining period fund is insufficient for the claim.
    #[error("FSH_ERR_400: Insufficient fund in {period}: need {needed}, remaining {remaining}")]
    InsufficientPeriodFund {
        period: PeriodId,
        needed: u128,
        remaining: u128,
    },

    /// Claimant already claimed this period.
    #[error("FSH_ERR_401: {claimant} already claimed {period}")]
    AlreadyClaimed { claimant: Address, period: PeriodId },

    /// Checked arithmetic would wrap.
    #[error("FSH_ERR_402: Arithmetic overflow in {context}")]
    Overflow { context: &'static str },

    /// Period counter is at its upper bound.
    #[error("FSH_ERR_403: Maximum period {max} reached")]
    MaxPeriodExceeded { max: u64 },

    /// Deposit would exceed the per-period cap.
    #[error("FSH_ERR_404: Deposit too large for {period}: {total} > cap {cap}")]
    TooLarge { period: PeriodId, total: u128, cap: u128 },

    /// Transfer shortfall exceeded the allowed slippage.
    #[error("FSH_ERR_405: Slippage too high: {shortfall_bps} bps > maximum {max_bps} bps")]
    SlippageTooHigh { shortfall_bps: u128, max_bps: u32 },

    /// Per-period fund invariant broken. Critical safety alert.
    #[error("FSH_ERR_406: Fund invariant violation: {reason}")]
    FundInvariantViolation { reason: String },

    /// A commitment already exists for the period.
    #[error("FSH_ERR_407: Root already posted for {0}")]
    RootAlreadyPosted(PeriodId),

    /// No commitment exists for the period.
    #[error("FSH_ERR_408: No commitment for {0}")]
    NoCommitment(PeriodId),

    /// The period's commitment is under dispute.
    #[error("FSH_ERR_409: Commitment for {0} is disputed")]
    CommitmentDisputed(PeriodId),

    /// Replacement requested for a commitment that is not disputed.
    #[error("FSH_ERR_410: Commitment for {0} is not disputed")]
    NotDisputed(PeriodId),

    /// The period's remaining fund has already been swept.
    #[error("FSH_ERR_411: {0} already swept")]
    AlreadySwept(PeriodId),

    // =================================================================
    // External Collaborators (5xx)
    // =================================================================
    /// The settlement collaborator failed a chunk.
    #[error("FSH_ERR_500: Settlement failed for operations [{start}, {end}): {reason}")]
    SettlementFailed {
        start: usize,
        end: usize,
        reason: String,
    },

    /// The settlement collaborator returned a misaligned result vector.
    #[error("FSH_ERR_501: Settlement returned {actual} results for {expected} operations")]
    SettlementResultMismatch { expected: usize, actual: usize },

    /// The payout token refused a transfer.
    #[error("FSH_ERR_502: Token transfer failed: {reason}")]
    TransferFailed { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FSH_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("FSH_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, inconsistent values, etc.).
    #[error("FSH_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("FSH_ERR_903: I/O error: {0}")]
    Io(String),
}

impl FisherError {
    /// Numeric code of this error (e.g. `401` for `AlreadyClaimed`).
    #[must_use]
    pub fn code(&self) -> u16 {
        let msg = self.to_string();
        msg.get(8..11)
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(900)
    }

    /// Whether the caller can recover simply by waiting and retrying.
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        (200..300).contains(&self.code())
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FisherError>;

impl From<std::io::Error> for FisherError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FisherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
