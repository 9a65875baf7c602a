//! # fisher-optimizer
//!
//! **Pure batch pipeline for Fisher.**
//!
//! The optimizer is the compute plane -- it takes a batch of signed
//! operations, routes each to a settlement strategy, and returns one
//! success flag per operation in input order. It has:
//!
//! - **Bounded working memory**: strong-path settlement runs in windows of
//!   `isqrt(n) * ilog2(n)` operations through one reused buffer
//! - **Order preservation**: classification keeps index maps, reassembly
//!   restores input order exactly
//! - **Era amortization**: era-bound operations bump one counter instead of
//!   per-participant state
//! - **Priority scoring**: integer age-and-amount scores for ordering the
//!   pending queue and rating sealed batches
//! - **No owned state**: the settlement ledger and era accumulator are
//!   collaborators passed in per call

pub mod chunk_sizer;
pub mod chunked_settler;
pub mod classifier;
pub mod cost;
pub mod determinism;
pub mod optimizer;
pub mod priority;
pub mod strategy;

pub use chunk_sizer::{chunk_size, ilog2, isqrt};
pub use chunked_settler::{ChunkReport, ChunkedSettler};
pub use classifier::{OperationKind, Partition, SubBatch, classify};
pub use cost::{
    BlobSavings, CostReport, EraSavings, blob_savings, era_savings, estimate, memory_savings,
};
pub use determinism::{compute_results_root, verify_results_root};
pub use optimizer::{BatchOptimizer, SettlementReport};
pub use priority::{batch_score, priority_score, priority_sort, top_by_priority};
pub use strategy::{ChunkedStrategy, EraBoundStrategy, SettlementStrategy, StrategyOutcome};
