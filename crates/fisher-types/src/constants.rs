//! System-wide constants for the Fisher batch settlement optimizer.

// ---------------------------------------------------------------------------
// Batch policy
// ---------------------------------------------------------------------------

/// Minimum number of operations a relayer seals into one batch.
pub const DEFAULT_MIN_BATCH_SIZE: usize = 10;

/// Maximum number of operations a relayer seals into one batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1_000;

/// Hard ceiling on batch size regardless of configuration.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Maximum operations held in the pending queue before submissions are refused.
pub const DEFAULT_MAX_PENDING: usize = 100_000;

/// Default relayer batch interval in milliseconds.
pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 5_000;

// ---------------------------------------------------------------------------
// Cost model (gas units)
// ---------------------------------------------------------------------------

/// Cost of settling one operation in its own transaction.
pub const NAIVE_COST_PER_OP: u64 = 100_000;

/// Marginal cost of one operation inside a batched settlement call.
pub const BATCHED_COST_PER_OP: u64 = 14_000;

/// Fixed overhead of one settlement call into the collaborator.
pub const COST_PER_SETTLE_CALL: u64 = 21_000;

/// Cost of one per-participant state update on the naive path.
pub const COST_PER_PARTICIPANT_UPDATE: u64 = 140_000;

/// Cost of bumping the era accumulator once.
pub const COST_PER_ERA_UPDATE: u64 = 5_000;

/// Cost of one byte of batch payload posted as calldata.
pub const CALLDATA_COST_PER_BYTE: u64 = 16;

/// Cost of one byte of batch payload posted as a blob.
pub const BLOB_COST_PER_BYTE: u64 = 2;

/// Fixed cost of verifying one blob commitment.
pub const BLOB_VERIFICATION_COST: u64 = 100_000;

// ---------------------------------------------------------------------------
// Era timing
// ---------------------------------------------------------------------------

/// Minimum seconds between two period advances (1 hour).
pub const DEFAULT_MIN_PERIOD_SECS: u64 = 3_600;

/// Seconds after which an advance is considered overdue (7 days).
pub const DEFAULT_MAX_PERIOD_SECS: u64 = 7 * 86_400;

/// Largest period number the era counter may reach.
pub const DEFAULT_MAX_PERIOD: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Delay between commitment posting and the first accepted claim (1 day).
pub const DEFAULT_CLAIM_DELAY_SECS: u64 = 86_400;

/// Claim window measured from the first commitment for a period (90 days).
pub const DEFAULT_CLAIM_WINDOW_SECS: u64 = 90 * 86_400;

/// Extra delay after the claim deadline before unclaimed funds may be swept (30 days).
pub const DEFAULT_SWEEP_DELAY_SECS: u64 = 30 * 86_400;

/// Minimum seconds between two deposits into the same period.
pub const DEFAULT_MIN_DEPOSIT_INTERVAL_SECS: u64 = 300;

/// Maximum cumulative deposit into a single period.
pub const DEFAULT_MAX_DEPOSIT_PER_PERIOD: u128 = 1_000_000_000_000_000_000_000_000;

/// Claims below this amount are rejected as dust.
pub const DEFAULT_MIN_CLAIM_AMOUNT: u128 = 10;

/// Maximum number of sibling hashes accepted in a claim proof.
pub const DEFAULT_MAX_PROOF_LEN: usize = 32;

/// Maximum number of periods claimed in one batch claim.
pub const DEFAULT_MAX_CLAIM_BATCH: usize = 50;

/// Maximum tolerated transfer shortfall, in basis points of the nominal amount.
pub const DEFAULT_MAX_SLIPPAGE_BPS: u32 = 100;

/// Basis point denominator.
pub const BPS_DENOMINATOR: u32 = 10_000;

// ---------------------------------------------------------------------------
// Dispute / recovery
// ---------------------------------------------------------------------------

/// Objection window after a commitment is posted (1 day).
pub const DEFAULT_OBJECTION_WINDOW_SECS: u64 = 86_400;

/// Minimum delay between a dispute and its replacement commitment (12 hours).
pub const DEFAULT_RESOLUTION_DELAY_SECS: u64 = 12 * 3_600;

/// Cooldown between two disputes raised by the same guardian (1 hour).
pub const DEFAULT_DISPUTE_COOLDOWN_SECS: u64 = 3_600;

/// Replacements tolerated before the authority is revoked.
pub const DEFAULT_MAX_STRIKES: u32 = 3;

/// Delay between a strike reset request and its execution (2 days).
pub const DEFAULT_STRIKE_RESET_DELAY_SECS: u64 = 2 * 86_400;

/// Authority inactivity window before liveness recovery opens (30 days).
pub const DEFAULT_LIVENESS_WINDOW_SECS: u64 = 30 * 86_400;

// ---------------------------------------------------------------------------
// Domain separation
// ---------------------------------------------------------------------------

/// Protocol version bound into every claim leaf and claim commitment.
pub const PROTOCOL_VERSION: u16 = 2;

/// Default chain identifier.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Fisher";
