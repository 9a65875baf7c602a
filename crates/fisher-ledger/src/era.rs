//! Era ledger: the monotonic period counter and its operation accumulator.
//!
//! Weak-path operations never touch per-participant state. They bump the
//! accumulator of the current period; when the period is advanced, the
//! accumulator is frozen into a [`PeriodSnapshot`] and per-participant
//! amounts are computed off-path from the snapshots.
//!
//! The counter starts at 0, grows by exactly 1 per advance and is never
//! decremented.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fisher_types::{EraConfig, FeeSchedule, FisherError, OverduePolicy, PeriodId, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fee::{period_fee, total_fee};

/// Frozen state of a closed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub period: PeriodId,
    /// Weak-path operations recorded during the period.
    pub operations: u64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    /// The period ran past the maximum duration before it was advanced.
    pub overdue: bool,
    /// Schedule in force when the period closed. Its fees are priced from
    /// this, never from later schedule changes.
    pub fee_schedule: FeeSchedule,
}

impl PeriodSnapshot {
    #[must_use]
    pub fn duration(&self) -> Duration {
        (self.closed_at - self.opened_at).to_std().unwrap_or_default()
    }
}

/// The era state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraLedger {
    config: EraConfig,
    current: PeriodId,
    /// Operations recorded in the current period.
    accumulator: u64,
    period_started_at: DateTime<Utc>,
    snapshots: BTreeMap<PeriodId, PeriodSnapshot>,
    total_operations: u64,
}

impl EraLedger {
    pub fn new(config: EraConfig, now: DateTime<Utc>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            current: PeriodId(0),
            accumulator: 0,
            period_started_at: now,
            snapshots: BTreeMap::new(),
            total_operations: 0,
        })
    }

    /// Add `count` operations to the current period.
    pub fn record_operations(&mut self, count: u64) -> Result<()> {
        let accumulator = self
            .accumulator
            .checked_add(count)
            .ok_or(FisherError::Overflow {
                context: "era accumulator",
            })?;
        let total = self
            .total_operations
            .checked_add(count)
            .ok_or(FisherError::Overflow {
                context: "era total operations",
            })?;
        self.accumulator = accumulator;
        self.total_operations = total;
        tracing::trace!(period = %self.current, count, accumulator, "Era operations recorded");
        Ok(())
    }

    /// Close the current period and open the next one.
    ///
    /// Authorization and halt checks belong to the caller.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<PeriodSnapshot> {
        let elapsed = (now - self.period_started_at).to_std().unwrap_or_default();
        if elapsed < self.config.min_period_duration {
            return Err(FisherError::TooSoon {
                elapsed,
                min: self.config.min_period_duration,
            });
        }
        if self.current.0 >= self.config.max_period {
            return Err(FisherError::MaxPeriodExceeded {
                max: self.config.max_period,
            });
        }
        let next = self.current.next().ok_or(FisherError::Overflow {
            context: "period counter",
        })?;

        let overdue = elapsed > self.config.max_period_duration;
        if overdue {
            match self.config.overdue_policy {
                OverduePolicy::Block => {
                    return Err(FisherError::Overdue {
                        elapsed,
                        max: self.config.max_period_duration,
                    });
                }
                OverduePolicy::Warn => {
                    tracing::warn!(
                        period = %self.current,
                        elapsed_secs = elapsed.as_secs(),
                        max_secs = self.config.max_period_duration.as_secs(),
                        "Period advanced after maximum duration"
                    );
                }
            }
        }

        let snapshot = PeriodSnapshot {
            period: self.current,
            operations: self.accumulator,
            opened_at: self.period_started_at,
            closed_at: now,
            overdue,
            fee_schedule: self.config.fee_schedule,
        };
        self.snapshots.insert(self.current, snapshot);
        self.current = next;
        self.accumulator = 0;
        self.period_started_at = now;

        tracing::info!(
            closed = %snapshot.period,
            opened = %next,
            operations = snapshot.operations,
            overdue,
            "Period advanced"
        );
        Ok(snapshot)
    }

    /// Whether the minimum duration has elapsed.
    #[must_use]
    pub fn should_advance(&self, now: DateTime<Utc>) -> bool {
        (now - self.period_started_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.config.min_period_duration)
    }

    // -----------------------------------------------------------------
    // Fees
    // -----------------------------------------------------------------

    /// Per-operation fee for `period`: the closing schedule for a closed
    /// period, the current one otherwise.
    pub fn period_fee(&self, period: PeriodId) -> Result<Decimal> {
        let schedule = self
            .snapshot(period)
            .map_or(&self.config.fee_schedule, |s| &s.fee_schedule);
        period_fee(schedule, period)
    }

    /// Fees owed by a closed period: recorded operations times its fee.
    pub fn fees_for_period(&self, period: PeriodId) -> Result<Decimal> {
        let snapshot = self.snapshot(period).ok_or(FisherError::PeriodNotClosed {
            period,
            current: self.current,
        })?;
        total_fee(period_fee(&snapshot.fee_schedule, period)?, snapshot.operations)
    }

    /// Fees for `count` operations at the current period's rate.
    pub fn batch_fees(&self, count: u64) -> Result<Decimal> {
        total_fee(self.period_fee(self.current)?, count)
    }

    pub fn set_fee_schedule(&mut self, schedule: FeeSchedule) -> Result<()> {
        schedule.validate()?;
        self.config.fee_schedule = schedule;
        tracing::info!(
            base_fee = %schedule.base_fee,
            rate = %schedule.rate,
            curve = ?schedule.curve,
            "Fee schedule updated"
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    #[must_use]
    pub fn current_period(&self) -> PeriodId {
        self.current
    }

    #[must_use]
    pub fn accumulator(&self) -> u64 {
        self.accumulator
    }

    #[must_use]
    pub fn total_operations(&self) -> u64 {
        self.total_operations
    }

    #[must_use]
    pub fn period_started_at(&self) -> DateTime<Utc> {
        self.period_started_at
    }

    #[must_use]
    pub fn snapshot(&self, period: PeriodId) -> Option<&PeriodSnapshot> {
        self.snapshots.get(&period)
    }

    /// `period` is strictly before the current period.
    #[must_use]
    pub fn is_closed(&self, period: PeriodId) -> bool {
        period < self.current
    }

    #[must_use]
    pub fn config(&self) -> &EraConfig {
        &self.config
    }
}
