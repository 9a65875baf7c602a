//! The relayer service: authorize → queue → batch → optimize → record.
//!
//! ```text
//! submit() ── Authorizer::verify ──► PendingQueue
//!                                        │  (len >= min_batch_size)
//! process_batch() ◄──────────────────────┘
//!   take(max_batch_size) ─► Batch{id, hash} ─► BatchOptimizer::optimize
//!                                                ├─ SettlementClient (chunked)
//!                                                └─ Ledger (era accumulator)
//! ```
//!
//! All shared state sits behind async mutexes so one `Arc<Relayer>` can be
//! used by submitters and the background batch loop at once. The ledger is
//! shared with the rest of the process through [`SharedLedger`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use fisher_ledger::{Ledger, PayoutToken};
use fisher_optimizer::{BatchOptimizer, SettlementReport};
use fisher_types::{
    Authorizer, Batch, BatchId, OperationId, Result, SettlementClient, SignedOperation,
};
use tokio::sync::{Mutex, watch};

use crate::config::RelayerConfig;
use crate::metrics::RelayerMetrics;
use crate::queue::PendingQueue;

/// The ledger aggregate behind one async mutex. Every ledger transition is
/// serialized through it.
pub type SharedLedger<T> = Arc<Mutex<Ledger<T>>>;

/// Wrap a ledger for sharing.
pub fn share<T: PayoutToken>(ledger: Ledger<T>) -> SharedLedger<T> {
    Arc::new(Mutex::new(ledger))
}

/// Batching relayer over a settlement collaborator.
pub struct Relayer<T, C, A>
where
    T: PayoutToken,
    C: SettlementClient,
    A: Authorizer,
{
    config: RelayerConfig,
    authorizer: A,
    queue: Mutex<PendingQueue>,
    optimizer: Mutex<BatchOptimizer>,
    client: Mutex<C>,
    ledger: SharedLedger<T>,
    metrics: Mutex<RelayerMetrics>,
    next_batch: AtomicU64,
}

impl<T, C, A> Relayer<T, C, A>
where
    T: PayoutToken,
    C: SettlementClient,
    A: Authorizer,
{
    pub fn new(config: RelayerConfig, authorizer: A, client: C, ledger: SharedLedger<T>) -> Result<Self> {
        config.validate()?;
        let optimizer = BatchOptimizer::new(config.optimizer.clone())?;
        tracing::info!(
            version = fisher_types::constants::VERSION,
            min_batch = config.optimizer.min_batch_size,
            max_batch = config.optimizer.max_batch_size,
            max_pending = config.max_pending,
            "Relayer initialized"
        );
        Ok(Self {
            queue: Mutex::new(PendingQueue::with_capacity(config.max_pending).with_ordering(config.ordering)),
            optimizer: Mutex::new(optimizer),
            client: Mutex::new(client),
            ledger,
            metrics: Mutex::new(RelayerMetrics::new()),
            next_batch: AtomicU64::new(1),
            authorizer,
            config,
        })
    }

    /// Verify and enqueue one operation.
    pub async fn submit(&self, operation: SignedOperation) -> Result<OperationId> {
        self.authorizer
            .verify(&operation.operation, &operation.signature)?;
        let id = operation.operation.id;
        let mut queue = self.queue.lock().await;
        queue.push(operation)?;
        tracing::debug!(operation = %id, pending = queue.len(), "Operation queued");
        Ok(id)
    }

    /// Seal and settle one batch if the queue holds enough operations.
    ///
    /// Returns `Ok(None)` when the queue is below the minimum batch size.
    /// On failure the batch goes back to the front of the queue.
    pub async fn process_batch(&self) -> Result<Option<SettlementReport>> {
        let operations = {
            let mut queue = self.queue.lock().await;
            let min = self.config.optimizer.min_batch_size;
            if queue.len() < min {
                tracing::debug!(pending = queue.len(), min, "Queue below minimum batch size");
                return Ok(None);
            }
            queue.take(self.config.optimizer.max_batch_size, Utc::now())
        };

        let id = BatchId(self.next_batch.fetch_add(1, Ordering::Relaxed));
        let batch = Batch::new(id, operations);
        tracing::info!(batch = %id, operations = batch.len(), hash = %batch.hash_hex(), "Batch sealed");

        let outcome = {
            let mut optimizer = self.optimizer.lock().await;
            let mut client = self.client.lock().await;
            let mut ledger = self.ledger.lock().await;
            optimizer.optimize(&batch, &mut *client, &mut *ledger)
        };

        match outcome {
            Ok(report) => {
                self.metrics.lock().await.record(&report);
                Ok(Some(report))
            }
            Err(e) => {
                tracing::warn!(batch = %id, error = %e, "Batch settlement failed, requeueing");
                self.metrics.lock().await.record_failure();
                self.queue.lock().await.requeue(batch.operations);
                Err(e)
            }
        }
    }

    /// Process batches until the queue drops below the minimum.
    pub async fn flush(&self) -> Result<Vec<SettlementReport>> {
        let mut reports = Vec::new();
        while let Some(report) = self.process_batch().await? {
            reports.push(report);
        }
        Ok(reports)
    }

    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn metrics(&self) -> RelayerMetrics {
        self.metrics.lock().await.clone()
    }

    #[must_use]
    pub fn config(&self) -> &RelayerConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &SharedLedger<T> {
        &self.ledger
    }
}

impl<T, C, A> Relayer<T, C, A>
where
    T: PayoutToken + Send + 'static,
    C: SettlementClient + Send + 'static,
    A: Authorizer + Send + Sync + 'static,
{
    /// Tick every `batch_interval` and process one batch per tick until
    /// `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.batch_interval());
        tracing::info!(interval_ms = self.config.batch_interval_ms, "Batch loop started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.process_batch().await {
                        tracing::warn!(error = %e, "Batch processing error");
                    }
                }
            }
        }
        let summary = self.metrics().await;
        tracing::info!(summary = %summary, "Batch loop stopped");
    }
}
