//! Batch optimizer: classify, settle per strategy, reassemble.
//!
//! ```text
//! optimize(Batch) -> SettlementReport
//! ```
//!
//! ## Pipeline
//!
//! 1. Enforce the min/max batch-size policy
//! 2. Classify into weak (era-bound) and strong groups
//! 3. Settle the strong group through the chunked strategy
//! 4. Settle the weak group through the era-bound strategy
//! 5. Reassemble results into input order
//! 6. Record the weak-path success count into the era accumulator
//!
//! Step 6 runs only when every group settled, so a failing batch never
//! leaves a partial era count behind.

use chrono::{DateTime, Utc};
use fisher_types::{
    Batch, BatchId, EraRecorder, FisherError, OptimizerConfig, Result, SettlementClient,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    classifier::classify,
    cost::{CostReport, estimate},
    determinism::compute_results_root,
    priority::batch_score,
    strategy::{ChunkedStrategy, EraBoundStrategy, SettlementStrategy, StrategyOutcome},
};

/// Everything the queueing collaborator gets back for one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReport {
    pub batch_id: BatchId,
    pub batch_hash: [u8; 32],
    /// One flag per input operation, in input order.
    pub results: Vec<bool>,
    pub strong_operations: usize,
    pub weak_operations: usize,
    /// Window size used for the strong group.
    pub strong_chunk_size: usize,
    /// Window size used for the weak group.
    pub weak_chunk_size: usize,
    pub settle_calls: usize,
    pub max_call_len: usize,
    /// Count added to the era accumulator.
    pub era_recorded: u64,
    pub cost: CostReport,
    /// Mean priority score of the batch at seal time.
    pub priority_score: Decimal,
    /// Digest over `(batch_hash, results)`.
    pub results_root: [u8; 32],
    pub settled_at: DateTime<Utc>,
}

impl SettlementReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|ok| **ok).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Classifier plus one strategy per operation kind.
#[derive(Debug)]
pub struct BatchOptimizer {
    config: OptimizerConfig,
    strong: ChunkedStrategy,
    weak: EraBoundStrategy,
}

impl BatchOptimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            strong: ChunkedStrategy::new(config.chunking_enabled),
            weak: EraBoundStrategy::new(config.chunking_enabled),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Reject batches outside the configured size policy.
    pub fn check_size(&self, len: usize) -> Result<()> {
        if len < self.config.min_batch_size {
            return Err(FisherError::BatchTooSmall {
                size: len,
                min: self.config.min_batch_size,
            });
        }
        if len > self.config.max_batch_size {
            return Err(FisherError::BatchTooLarge {
                size: len,
                max: self.config.max_batch_size,
            });
        }
        Ok(())
    }

    /// Settle `batch` and return index-aligned results plus statistics.
    pub fn optimize<C, E>(
        &mut self,
        batch: &Batch,
        client: &mut C,
        era: &mut E,
    ) -> Result<SettlementReport>
    where
        C: SettlementClient,
        E: EraRecorder + ?Sized,
    {
        self.check_size(batch.len())?;

        let partition = classify(&batch.operations, self.config.era_path_enabled);

        let strong: StrategyOutcome = self.strong.execute(&partition.strong, &mut *client)?;
        let weak: StrategyOutcome = self.weak.execute(&partition.weak, &mut *client)?;

        let results = partition.reassemble(&weak.report.results, &strong.report.results)?;

        let era_recorded = weak.era_operations;
        if era_recorded > 0 {
            era.record_operations(era_recorded)?;
        }

        let settle_calls = strong.report.calls + weak.report.calls;
        let cost = estimate(
            &self.config.cost_model,
            batch.len() as u64,
            settle_calls as u64,
            u64::from(era_recorded > 0),
        );

        let report = SettlementReport {
            batch_id: batch.id,
            batch_hash: batch.batch_hash,
            results_root: compute_results_root(&batch.batch_hash, &results),
            results,
            strong_operations: partition.strong.len(),
            weak_operations: partition.weak.len(),
            strong_chunk_size: strong.report.chunk_size,
            weak_chunk_size: weak.report.chunk_size,
            settle_calls,
            max_call_len: strong.report.max_call_len.max(weak.report.max_call_len),
            era_recorded,
            cost,
            priority_score: batch_score(&batch.operations, batch.sealed_at),
            settled_at: Utc::now(),
        };

        tracing::info!(
            batch = %batch.id,
            operations = batch.len(),
            strong = report.strong_operations,
            weak = report.weak_operations,
            succeeded = report.succeeded(),
            calls = report.settle_calls,
            saved = report.cost.saved,
            savings_percent = %report.cost.savings_percent,
            priority = %report.priority_score,
            "Batch settlement complete"
        );

        Ok(report)
    }
}
