//! # fisher-relayer
//!
//! **Service plane**: operation ingress, batching, and the background
//! settlement loop.
//!
//! ## Architecture
//!
//! The relayer sits between submitters and the optimizer:
//! 1. **Authorizer**: every submission is verified against its signature
//! 2. **PendingQueue**: verified operations wait in arrival order and
//!    leave in arrival or priority order
//! 3. **Relayer**: seals batches within the min/max size policy and hands
//!    them to the optimizer
//! 4. **SharedLedger**: weak-path counts land in the era accumulator of
//!    the one ledger shared behind an async mutex
//! 5. **RelayerMetrics**: running totals and averages per batch
//!
//! ## Operation Flow
//!
//! ```text
//! submit() → Authorizer.verify() → PendingQueue.push()
//!     → process_batch() → Batch → BatchOptimizer.optimize() → SettlementReport
//! ```

pub mod config;
pub mod metrics;
pub mod queue;
pub mod relayer;

pub use config::{OrderingPolicy, RelayerConfig};
pub use metrics::RelayerMetrics;
pub use queue::PendingQueue;
pub use relayer::{Relayer, SharedLedger, share};
