//! Settlement strategies, one per [`OperationKind`].
//!
//! - [`ChunkedStrategy`] settles strong operations through the
//!   [`ChunkedSettler`].
//! - [`EraBoundStrategy`] settles weak operations the same way but skips the
//!   per-participant state update; instead it reports how many operations
//!   succeeded so the caller can bump the era accumulator once.
//!
//! Strategies never touch the era accumulator themselves. The optimizer
//! records the era count only after every group has settled, so a failure
//! in any group leaves the accumulator untouched.

use fisher_types::{Result, SettlementClient};

use crate::{
    chunked_settler::{ChunkReport, ChunkedSettler},
    classifier::{OperationKind, SubBatch},
};

/// What a strategy produced for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyOutcome {
    pub report: ChunkReport,
    /// Operations to add to the era accumulator.
    pub era_operations: u64,
}

/// A settlement path for one kind of operation.
pub trait SettlementStrategy {
    fn kind(&self) -> OperationKind;

    fn execute(
        &mut self,
        group: &SubBatch<'_>,
        client: &mut dyn SettlementClient,
    ) -> Result<StrategyOutcome>;
}

// ---------------------------------------------------------------------------
// Strong path
// ---------------------------------------------------------------------------

/// Generic operations: chunked settlement, nothing else.
#[derive(Debug, Default)]
pub struct ChunkedStrategy {
    settler: ChunkedSettler,
}

impl ChunkedStrategy {
    #[must_use]
    pub fn new(chunking: bool) -> Self {
        Self {
            settler: ChunkedSettler::with_chunking(chunking),
        }
    }
}

impl SettlementStrategy for ChunkedStrategy {
    fn kind(&self) -> OperationKind {
        OperationKind::Strong
    }

    fn execute(
        &mut self,
        group: &SubBatch<'_>,
        client: &mut dyn SettlementClient,
    ) -> Result<StrategyOutcome> {
        let report = self.settler.settle(client, &group.operations)?;
        Ok(StrategyOutcome {
            report,
            era_operations: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Weak (era) path
// ---------------------------------------------------------------------------

/// Era-bound operations: settled in windows, counted once into the era.
#[derive(Debug, Default)]
pub struct EraBoundStrategy {
    settler: ChunkedSettler,
}

impl EraBoundStrategy {
    #[must_use]
    pub fn new(chunking: bool) -> Self {
        Self {
            settler: ChunkedSettler::with_chunking(chunking),
        }
    }
}

impl SettlementStrategy for EraBoundStrategy {
    fn kind(&self) -> OperationKind {
        OperationKind::Weak
    }

    fn execute(
        &mut self,
        group: &SubBatch<'_>,
        client: &mut dyn SettlementClient,
    ) -> Result<StrategyOutcome> {
        let report = self.settler.settle(client, &group.operations)?;
        let era_operations = report.succeeded() as u64;
        Ok(StrategyOutcome {
            report,
            era_operations,
        })
    }
}
