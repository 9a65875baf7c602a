//! End-to-end relayer flow: submit → queue → batch → optimizer → ledger.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use ed25519_dalek::SigningKey;
use fisher_ledger::{InMemoryToken, Ledger};
use fisher_relayer::{OrderingPolicy, Relayer, RelayerConfig, SharedLedger, share};
use fisher_types::{
    Address, CallContext, Ed25519Authorizer, FisherError, OperationId, OptimizerConfig,
    ProtocolConfig, Result, SettlementClient, SignedOperation, TrustingAuthorizer,
};
use rand::rngs::OsRng;
use tokio::sync::watch;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn ledger() -> SharedLedger<InMemoryToken> {
    let authority = Address::from_tag(1);
    let now = CallContext::at(authority, 0).now;
    let ledger = Ledger::new(
        ProtocolConfig::default(),
        authority,
        Some(Address::from_tag(2)),
        InMemoryToken::new(),
        now,
    )
    .unwrap();
    share(ledger)
}

fn config(min: usize, max: usize, max_pending: usize) -> RelayerConfig {
    RelayerConfig {
        optimizer: OptimizerConfig {
            min_batch_size: min,
            max_batch_size: max,
            ..OptimizerConfig::default()
        },
        batch_interval_ms: 10,
        max_pending,
        ordering: OrderingPolicy::Fifo,
    }
}

// ---------------------------------------------------------------------------
// Settlement collaborators
// ---------------------------------------------------------------------------

/// Accepts everything and records the ids it settled, in call order.
#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<StdMutex<Vec<OperationId>>>,
    calls: Arc<AtomicUsize>,
}

impl SettlementClient for Recorder {
    fn settle(&mut self, operations: &[SignedOperation]) -> Result<Vec<bool>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut seen = self.seen.lock().unwrap();
        seen.extend(operations.iter().map(|s| s.operation.id));
        Ok(vec![true; operations.len()])
    }
}

/// Rejects operations with an odd amount.
struct RejectOdd;

impl SettlementClient for RejectOdd {
    fn settle(&mut self, operations: &[SignedOperation]) -> Result<Vec<bool>> {
        Ok(operations
            .iter()
            .map(|s| s.operation.amount % 2 == 0)
            .collect())
    }
}

/// Fails the first `failures` calls, then behaves like [`Recorder`].
#[derive(Clone)]
struct Flaky {
    failures: Arc<AtomicUsize>,
    inner: Recorder,
}

impl Flaky {
    fn new(failures: usize) -> Self {
        Self {
            failures: Arc::new(AtomicUsize::new(failures)),
            inner: Recorder::default(),
        }
    }
}

impl SettlementClient for Flaky {
    fn settle(&mut self, operations: &[SignedOperation]) -> Result<Vec<bool>> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(FisherError::Internal("settlement node unavailable".into()));
        }
        self.inner.settle(operations)
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_verifies_signatures() {
    init_tracing();
    let relayer = Relayer::new(config(1, 10, 100), Ed25519Authorizer, Recorder::default(), ledger()).unwrap();

    let key = SigningKey::generate(&mut OsRng);
    let good = SignedOperation::signed_by(&key, Address::from_tag(9), 1_000, false, 1);
    let id = relayer.submit(good.clone()).await.unwrap();
    assert_eq!(id, good.operation.id);

    let mut tampered = good;
    tampered.operation.amount += 1;
    let err = relayer.submit(tampered).await.unwrap_err();
    assert!(matches!(err, FisherError::InvalidSignature(_)));

    let err = relayer
        .submit(SignedOperation::dummy(5, false))
        .await
        .unwrap_err();
    assert!(matches!(err, FisherError::InvalidSignature(_)));

    assert_eq!(relayer.pending().await, 1);
}

#[tokio::test]
async fn queue_capacity_is_enforced() {
    let relayer = Relayer::new(config(1, 2, 2), TrustingAuthorizer, Recorder::default(), ledger()).unwrap();
    relayer.submit(SignedOperation::dummy(1, false)).await.unwrap();
    relayer.submit(SignedOperation::dummy(2, false)).await.unwrap();
    let err = relayer
        .submit(SignedOperation::dummy(3, false))
        .await
        .unwrap_err();
    assert!(matches!(err, FisherError::QueueFull { capacity: 2 }));
}

#[test]
fn invalid_config_rejected_at_construction() {
    let bad = config(1, 50, 10);
    let result = Relayer::new(bad, TrustingAuthorizer, Recorder::default(), ledger());
    assert!(matches!(result, Err(FisherError::Configuration(_))));
}

// ---------------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn below_minimum_leaves_queue_untouched() {
    let client = Recorder::default();
    let calls = client.calls.clone();
    let relayer = Relayer::new(config(10, 100, 1_000), TrustingAuthorizer, client, ledger()).unwrap();
    for amount in 0..5 {
        relayer.submit(SignedOperation::dummy(amount, false)).await.unwrap();
    }

    assert!(relayer.process_batch().await.unwrap().is_none());
    assert_eq!(relayer.pending().await, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn flush_seals_batches_of_at_most_max() {
    init_tracing();
    let client = Recorder::default();
    let seen = client.seen.clone();
    let relayer = Relayer::new(config(5, 20, 1_000), TrustingAuthorizer, client, ledger()).unwrap();

    let mut submitted = Vec::new();
    for amount in 0..45 {
        submitted.push(relayer.submit(SignedOperation::dummy(amount, false)).await.unwrap());
    }

    let reports = relayer.flush().await.unwrap();
    let sizes: Vec<usize> = reports.iter().map(|r| r.results.len()).collect();
    assert_eq!(sizes, vec![20, 20, 5]);
    assert_eq!(relayer.pending().await, 0);
    assert_ne!(reports[0].batch_id, reports[1].batch_id);

    assert_eq!(*seen.lock().unwrap(), submitted);
}

#[tokio::test]
async fn weak_operations_land_in_shared_ledger() {
    let shared = ledger();
    let relayer = Relayer::new(config(1, 100, 1_000), TrustingAuthorizer, Recorder::default(), shared.clone()).unwrap();

    for _ in 0..30 {
        relayer.submit(SignedOperation::dummy(10, false)).await.unwrap();
    }
    for _ in 0..20 {
        relayer.submit(SignedOperation::dummy(10, true)).await.unwrap();
    }

    let report = relayer.process_batch().await.unwrap().unwrap();
    assert_eq!(report.strong_operations, 30);
    assert_eq!(report.weak_operations, 20);
    assert_eq!(report.era_recorded, 20);
    assert_eq!(shared.lock().await.era().accumulator(), 20);

    let metrics = relayer.metrics().await;
    assert_eq!(metrics.total_era_operations, 20);
}

#[tokio::test]
async fn failed_batch_is_requeued_in_order() {
    init_tracing();
    let client = Flaky::new(1);
    let seen = client.inner.seen.clone();
    let shared = ledger();
    let relayer = Relayer::new(config(10, 10, 100), TrustingAuthorizer, client, shared.clone()).unwrap();

    let mut submitted = Vec::new();
    for amount in 0..10 {
        submitted.push(relayer.submit(SignedOperation::dummy(amount, amount % 2 == 0)).await.unwrap());
    }

    let err = relayer.process_batch().await.unwrap_err();
    assert!(matches!(err, FisherError::SettlementFailed { .. } | FisherError::Internal(_)));
    assert_eq!(relayer.pending().await, 10);
    assert_eq!(shared.lock().await.era().accumulator(), 0);
    assert_eq!(relayer.metrics().await.failed_batches, 1);

    let report = relayer.process_batch().await.unwrap().unwrap();
    assert_eq!(report.succeeded(), 10);
    assert_eq!(relayer.pending().await, 0);

    let mut settled = seen.lock().unwrap().clone();
    settled.sort();
    submitted.sort();
    assert_eq!(settled, submitted);
}

#[tokio::test]
async fn metrics_track_rejections_and_averages() {
    let relayer = Relayer::new(config(10, 10, 100), TrustingAuthorizer, RejectOdd, ledger()).unwrap();
    for round in 0..2u128 {
        for amount in 0..10 {
            relayer
                .submit(SignedOperation::dummy(round * 10 + amount, false))
                .await
                .unwrap();
        }
        relayer.process_batch().await.unwrap().unwrap();
    }

    let metrics = relayer.metrics().await;
    assert_eq!(metrics.total_batches, 2);
    assert_eq!(metrics.total_operations, 20);
    assert_eq!(metrics.total_rejected, 10);
    assert_eq!(metrics.failed_batches, 0);
    assert_eq!(metrics.avg_batch_size, rust_decimal::Decimal::from(10));
    assert!(metrics.summary().contains("rejected=10"));
}

#[tokio::test]
async fn priority_ordering_settles_oldest_first() {
    let client = Recorder::default();
    let seen = client.seen.clone();
    let relayer = Relayer::new(
        RelayerConfig {
            ordering: OrderingPolicy::Priority,
            ..config(2, 2, 100)
        },
        TrustingAuthorizer,
        client,
        ledger(),
    )
    .unwrap();

    let now = chrono::Utc::now();
    let mut ids = Vec::new();
    for age_secs in [0, 40_000, 10, 90_000] {
        let mut op = SignedOperation::dummy(1_000, false);
        op.operation.submitted_at = now - chrono::Duration::seconds(age_secs);
        ids.push(relayer.submit(op).await.unwrap());
    }

    let report = relayer.process_batch().await.unwrap().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![ids[3], ids[1]]);
    assert!(report.priority_score > rust_decimal::Decimal::from(200));
    assert_eq!(relayer.pending().await, 2);
}

// ---------------------------------------------------------------------------
// Background loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_loop_drains_queue_and_stops_on_shutdown() {
    init_tracing();
    let client = Recorder::default();
    let seen = client.seen.clone();
    let relayer = Arc::new(Relayer::new(config(1, 4, 100), TrustingAuthorizer, client, ledger()).unwrap());

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(relayer.clone().run(rx));

    for amount in 0..10 {
        relayer.submit(SignedOperation::dummy(amount, false)).await.unwrap();
    }

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while relayer.metrics().await.total_operations < 10 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(drained.is_ok(), "queue was not drained");
    assert_eq!(relayer.pending().await, 0);
    assert_eq!(seen.lock().unwrap().len(), 10);

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop did not stop")
        .unwrap();

    let metrics = relayer.metrics().await;
    assert_eq!(metrics.total_operations, 10);
    assert!(metrics.total_batches >= 3);
}
