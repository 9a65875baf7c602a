//! Configuration for the optimizer, era ledger, claim ledger and recovery
//! protocol.
//!
//! Every protocol constant lives here and is passed in at construction.
//! Defaults are taken from [`constants`].

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, FisherError, Result, constants};

fn invalid(msg: impl Into<String>) -> FisherError {
    FisherError::Configuration(msg.into())
}

// ---------------------------------------------------------------------------
// Era
// ---------------------------------------------------------------------------

/// What `advance` does once the maximum period duration has passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverduePolicy {
    /// Accept the advance, flag the snapshot as overdue and log a warning.
    #[default]
    Warn,
    /// Refuse the advance with `Overdue`.
    Block,
}

/// Direction of the per-period fee recurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeCurve {
    /// `base * (1 + rate)^period`
    Growth,
    /// `base * (1 - rate)^period`
    #[default]
    Decay,
}

/// Closed-form per-period fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee per operation in period 0.
    pub base_fee: Decimal,
    /// Per-period rate, e.g. `0.01` for 1%.
    pub rate: Decimal,
    pub curve: FeeCurve,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: Decimal::new(1, 0),
            rate: Decimal::new(1, 2), // 1%
            curve: FeeCurve::Decay,
        }
    }
}

impl FeeSchedule {
    pub fn validate(&self) -> Result<()> {
        if self.base_fee.is_sign_negative() {
            return Err(invalid("fee base must be non-negative"));
        }
        if self.rate.is_sign_negative() {
            return Err(invalid("fee rate must be non-negative"));
        }
        if self.curve == FeeCurve::Decay && self.rate > Decimal::ONE {
            return Err(invalid("decay rate must not exceed 1"));
        }
        Ok(())
    }
}

/// Era timing and fee configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraConfig {
    /// Minimum time between two advances.
    pub min_period_duration: Duration,
    /// Time after which an advance is overdue.
    pub max_period_duration: Duration,
    /// Largest period number the counter may reach.
    pub max_period: u64,
    pub overdue_policy: OverduePolicy,
    pub fee_schedule: FeeSchedule,
}

impl Default for EraConfig {
    fn default() -> Self {
        Self {
            min_period_duration: Duration::from_secs(constants::DEFAULT_MIN_PERIOD_SECS),
            max_period_duration: Duration::from_secs(constants::DEFAULT_MAX_PERIOD_SECS),
            max_period: constants::DEFAULT_MAX_PERIOD,
            overdue_policy: OverduePolicy::default(),
            fee_schedule: FeeSchedule::default(),
        }
    }
}

impl EraConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_period_duration.is_zero() {
            return Err(invalid("min_period_duration must be positive"));
        }
        if self.max_period_duration < self.min_period_duration {
            return Err(invalid("max_period_duration must be >= min_period_duration"));
        }
        if self.max_period == 0 {
            return Err(invalid("max_period must be positive"));
        }
        self.fee_schedule.validate()
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Deposit and claim limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimConfig {
    /// Delay between commitment posting and the first accepted claim.
    pub claim_delay: Duration,
    /// Length of the claim window, from the first commitment for a period.
    pub claim_window: Duration,
    /// Extra wait after the claim deadline before sweeping.
    pub sweep_delay: Duration,
    /// Minimum gap between deposits into the same period.
    pub min_deposit_interval: Duration,
    pub max_deposit_per_period: u128,
    /// Dust threshold: claims below this are rejected.
    pub min_claim_amount: u128,
    pub max_proof_len: usize,
    pub max_claim_batch: usize,
    /// Maximum transfer shortfall, in basis points.
    pub max_slippage_bps: u32,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            claim_delay: Duration::from_secs(constants::DEFAULT_CLAIM_DELAY_SECS),
            claim_window: Duration::from_secs(constants::DEFAULT_CLAIM_WINDOW_SECS),
            sweep_delay: Duration::from_secs(constants::DEFAULT_SWEEP_DELAY_SECS),
            min_deposit_interval: Duration::from_secs(constants::DEFAULT_MIN_DEPOSIT_INTERVAL_SECS),
            max_deposit_per_period: constants::DEFAULT_MAX_DEPOSIT_PER_PERIOD,
            min_claim_amount: constants::DEFAULT_MIN_CLAIM_AMOUNT,
            max_proof_len: constants::DEFAULT_MAX_PROOF_LEN,
            max_claim_batch: constants::DEFAULT_MAX_CLAIM_BATCH,
            max_slippage_bps: constants::DEFAULT_MAX_SLIPPAGE_BPS,
        }
    }
}

impl ClaimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.claim_window <= self.claim_delay {
            return Err(invalid("claim_window must exceed claim_delay"));
        }
        if self.max_deposit_per_period == 0 {
            return Err(invalid("max_deposit_per_period must be positive"));
        }
        if self.max_proof_len == 0 || self.max_claim_batch == 0 {
            return Err(invalid("max_proof_len and max_claim_batch must be positive"));
        }
        if self.max_slippage_bps > constants::BPS_DENOMINATOR {
            return Err(invalid(format!(
                "max_slippage_bps {} exceeds {}",
                self.max_slippage_bps,
                constants::BPS_DENOMINATOR
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispute / recovery
// ---------------------------------------------------------------------------

/// Dispute, strike and liveness-recovery timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Window after posting during which the guardian may dispute.
    pub objection_window: Duration,
    /// Minimum gap between a dispute and its replacement.
    pub resolution_delay: Duration,
    /// Minimum gap between two disputes by the same guardian.
    pub dispute_cooldown: Duration,
    /// Strike count at which the authority is revoked.
    pub max_strikes: u32,
    pub strike_reset_delay: Duration,
    /// Authority inactivity after which liveness recovery opens.
    pub liveness_window: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            objection_window: Duration::from_secs(constants::DEFAULT_OBJECTION_WINDOW_SECS),
            resolution_delay: Duration::from_secs(constants::DEFAULT_RESOLUTION_DELAY_SECS),
            dispute_cooldown: Duration::from_secs(constants::DEFAULT_DISPUTE_COOLDOWN_SECS),
            max_strikes: constants::DEFAULT_MAX_STRIKES,
            strike_reset_delay: Duration::from_secs(constants::DEFAULT_STRIKE_RESET_DELAY_SECS),
            liveness_window: Duration::from_secs(constants::DEFAULT_LIVENESS_WINDOW_SECS),
        }
    }
}

impl RecoveryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_strikes == 0 {
            return Err(invalid("max_strikes must be at least 1"));
        }
        if self.objection_window.is_zero() || self.liveness_window.is_zero() {
            return Err(invalid("objection_window and liveness_window must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Domain separation
// ---------------------------------------------------------------------------

/// Values bound into every claim leaf so proofs cannot be replayed across
/// chains, deployments or protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub chain_id: u64,
    /// Identity of this ledger deployment.
    pub contract: Address,
    pub version: u16,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            chain_id: constants::DEFAULT_CHAIN_ID,
            contract: Address::ZERO,
            version: constants::PROTOCOL_VERSION,
        }
    }
}

impl DomainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chain_id == 0 {
            return Err(invalid("chain_id must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Gas-unit cost model used for reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub naive_per_op: u64,
    pub batched_per_op: u64,
    pub per_settle_call: u64,
    pub per_participant_update: u64,
    pub per_era_update: u64,
    pub per_calldata_byte: u64,
    pub per_blob_byte: u64,
    pub blob_verification: u64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            naive_per_op: constants::NAIVE_COST_PER_OP,
            batched_per_op: constants::BATCHED_COST_PER_OP,
            per_settle_call: constants::COST_PER_SETTLE_CALL,
            per_participant_update: constants::COST_PER_PARTICIPANT_UPDATE,
            per_era_update: constants::COST_PER_ERA_UPDATE,
            per_calldata_byte: constants::CALLDATA_COST_PER_BYTE,
            per_blob_byte: constants::BLOB_COST_PER_BYTE,
            blob_verification: constants::BLOB_VERIFICATION_COST,
        }
    }
}

/// Batch-size policy and strategy selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    /// Route period-bound operations through the era path. When disabled
    /// every operation is settled on the strong path.
    pub era_path_enabled: bool,
    /// Chunk strong-path settlement. When disabled the whole group goes
    /// out in one call.
    pub chunking_enabled: bool,
    pub cost_model: CostModel,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_batch_size: constants::DEFAULT_MIN_BATCH_SIZE,
            max_batch_size: constants::DEFAULT_MAX_BATCH_SIZE,
            era_path_enabled: true,
            chunking_enabled: true,
            cost_model: CostModel::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_batch_size == 0 {
            return Err(invalid("min_batch_size must be at least 1"));
        }
        if self.min_batch_size > self.max_batch_size {
            return Err(invalid(format!(
                "min_batch_size {} exceeds max_batch_size {}",
                self.min_batch_size, self.max_batch_size
            )));
        }
        if self.max_batch_size > constants::MAX_BATCH_SIZE {
            return Err(invalid(format!(
                "max_batch_size {} exceeds hard limit {}",
                self.max_batch_size,
                constants::MAX_BATCH_SIZE
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProtocolConfig
// ---------------------------------------------------------------------------

/// Everything the ledger needs at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub era: EraConfig,
    pub claims: ClaimConfig,
    pub recovery: RecoveryConfig,
    pub domain: DomainConfig,
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<()> {
        self.era.validate()?;
        self.claims.validate()?;
        self.recovery.validate()?;
        self.domain.validate()?;
        // A claim must never be accepted while the commitment can still be disputed.
        if self.claims.claim_delay < self.recovery.objection_window {
            return Err(invalid("claim_delay must be >= objection_window"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ProtocolConfig::default().validate().unwrap();
        OptimizerConfig::default().validate().unwrap();
    }

    #[test]
    fn overdue_policy_defaults_to_warn() {
        assert_eq!(EraConfig::default().overdue_policy, OverduePolicy::Warn);
    }

    #[test]
    fn claim_delay_shorter_than_objection_window_rejected() {
        let mut cfg = ProtocolConfig::default();
        cfg.claims.claim_delay = Duration::from_secs(60);
        let err = cfg.validate().unwrap_err();
        assert!(format!("{err}").contains("FSH_ERR_902"));
    }

    #[test]
    fn optimizer_min_above_max_rejected() {
        let cfg = OptimizerConfig {
            min_batch_size: 100,
            max_batch_size: 10,
            ..OptimizerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn slippage_above_denominator_rejected() {
        let cfg = ClaimConfig {
            max_slippage_bps: 10_001,
            ..ClaimConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn decay_rate_above_one_rejected() {
        let fees = FeeSchedule {
            base_fee: Decimal::ONE,
            rate: Decimal::new(15, 1),
            curve: FeeCurve::Decay,
        };
        assert!(fees.validate().is_err());
        let growth = FeeSchedule {
            curve: FeeCurve::Growth,
            ..fees
        };
        assert!(growth.validate().is_ok());
    }

    #[test]
    fn protocol_config_serde_roundtrip() {
        let cfg = ProtocolConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ProtocolConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.era.fee_schedule, cfg.era.fee_schedule);
        assert_eq!(back.claims.max_deposit_per_period, cfg.claims.max_deposit_per_period);
        assert_eq!(back.recovery.max_strikes, cfg.recovery.max_strikes);
    }
}
