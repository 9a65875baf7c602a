//! Relayer metrics: running totals and averages over settled batches.

use std::fmt;

use fisher_optimizer::SettlementReport;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Counters updated once per settled (or failed) batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayerMetrics {
    pub total_batches: u64,
    pub total_operations: u64,
    /// Operations the settlement collaborator rejected.
    pub total_rejected: u64,
    pub failed_batches: u64,
    pub total_cost_saved: u128,
    pub total_era_operations: u64,
    pub avg_batch_size: Decimal,
    pub avg_savings_percent: Decimal,
}

/// `avg + (x - avg) / n`.
fn running_average(avg: Decimal, x: Decimal, n: u64) -> Decimal {
    if n == 0 {
        return avg;
    }
    (avg + (x - avg) / Decimal::from(n)).round_dp(4)
}

impl RelayerMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one settled batch into the totals.
    pub fn record(&mut self, report: &SettlementReport) {
        let size = report.results.len() as u64;
        self.total_batches += 1;
        self.total_operations += size;
        self.total_rejected += report.failed() as u64;
        self.total_cost_saved += u128::from(report.cost.saved);
        self.total_era_operations += report.era_recorded;
        self.avg_batch_size = running_average(self.avg_batch_size, Decimal::from(size), self.total_batches);
        self.avg_savings_percent = running_average(
            self.avg_savings_percent,
            report.cost.savings_percent,
            self.total_batches,
        );
    }

    pub fn record_failure(&mut self) {
        self.failed_batches += 1;
    }

    /// One-paragraph human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RelayerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batches={} (failed {}) operations={} rejected={} era_operations={} \
             cost_saved={} avg_batch_size={} avg_savings={}%",
            self.total_batches,
            self.failed_batches,
            self.total_operations,
            self.total_rejected,
            self.total_era_operations,
            self.total_cost_saved,
            self.avg_batch_size.normalize(),
            self.avg_savings_percent.normalize(),
        )
    }
}
