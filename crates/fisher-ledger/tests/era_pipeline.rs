//! Optimizer → ledger: weak-path operations land in the era accumulator
//! and drive per-period fees.

mod common;

use common::{HOUR, Harness};
use fisher_optimizer::BatchOptimizer;
use fisher_types::{
    Batch, BatchId, FisherError, OptimizerConfig, PeriodId, Result, SettlementClient,
    SignedOperation,
};
use rust_decimal::Decimal;

/// Accepts every operation.
#[derive(Default)]
struct AcceptAll {
    calls: usize,
}

impl SettlementClient for AcceptAll {
    fn settle(&mut self, operations: &[SignedOperation]) -> Result<Vec<bool>> {
        self.calls += 1;
        Ok(vec![true; operations.len()])
    }
}

struct Offline;

impl SettlementClient for Offline {
    fn settle(&mut self, _operations: &[SignedOperation]) -> Result<Vec<bool>> {
        Err(FisherError::Internal("settlement offline".into()))
    }
}

fn batch(id: u64, strong: usize, weak: usize) -> Batch {
    let ops = (0..strong)
        .map(|_| SignedOperation::dummy(10, false))
        .chain((0..weak).map(|_| SignedOperation::dummy(10, true)))
        .collect();
    Batch::new(BatchId(id), ops)
}

#[test]
fn weak_operations_accumulate_into_current_period() {
    let mut h = Harness::new(0);
    let mut optimizer = BatchOptimizer::new(OptimizerConfig::default()).unwrap();
    let mut client = AcceptAll::default();

    let report = optimizer
        .optimize(&batch(1, 60, 40), &mut client, &mut h.ledger)
        .unwrap();
    assert_eq!(report.era_recorded, 40);
    assert_eq!(report.succeeded(), 100);
    assert_eq!(h.ledger.era().accumulator(), 40);

    optimizer
        .optimize(&batch(2, 0, 25), &mut client, &mut h.ledger)
        .unwrap();
    assert_eq!(h.ledger.era().accumulator(), 65);

    h.wait(HOUR);
    let snapshot = h.ledger.advance_period(&h.auth()).unwrap();
    assert_eq!(snapshot.operations, 65);
    assert_eq!(h.ledger.era().accumulator(), 0);
    // Default schedule: base fee 1 in period 0.
    assert_eq!(
        h.ledger.fees_for_period(PeriodId(0)).unwrap(),
        Decimal::new(65, 0)
    );
}

#[test]
fn failed_settlement_records_nothing() {
    let mut h = Harness::new(0);
    let mut optimizer = BatchOptimizer::new(OptimizerConfig::default()).unwrap();
    let err = optimizer
        .optimize(&batch(1, 50, 50), &mut Offline, &mut h.ledger)
        .unwrap_err();
    assert!(matches!(err, FisherError::SettlementFailed { .. }));
    assert_eq!(h.ledger.era().accumulator(), 0);
}

#[test]
fn era_path_disabled_settles_everything_strong() {
    let mut h = Harness::new(0);
    let config = OptimizerConfig {
        era_path_enabled: false,
        ..OptimizerConfig::default()
    };
    let mut optimizer = BatchOptimizer::new(config).unwrap();
    let report = optimizer
        .optimize(&batch(1, 10, 90), &mut AcceptAll::default(), &mut h.ledger)
        .unwrap();
    assert_eq!(report.era_recorded, 0);
    assert_eq!(report.strong_operations, 100);
    assert_eq!(h.ledger.era().accumulator(), 0);
}
