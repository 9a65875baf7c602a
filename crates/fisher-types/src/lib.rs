//! # fisher-types
//!
//! Shared types, errors, and configuration for the **Fisher** batch
//! settlement optimizer.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`OperationId`], [`BatchId`], [`PeriodId`]
//! - **Operation model**: [`Operation`], [`SignedOperation`], [`Batch`]
//! - **Call context**: [`CallContext`] (caller, time, block height)
//! - **Collaborators**: [`SettlementClient`], [`EraRecorder`], [`Authorizer`]
//! - **Authorization**: [`Ed25519Authorizer`]
//! - **Configuration**: [`ProtocolConfig`], [`EraConfig`], [`ClaimConfig`],
//!   [`RecoveryConfig`], [`DomainConfig`], [`OptimizerConfig`]
//! - **Errors**: [`FisherError`] with `FSH_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod auth;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod ids;
pub mod operation;
pub mod traits;

// Re-export all primary types at crate root for ergonomic imports:
//   use fisher_types::{Operation, SignedOperation, PeriodId, ...};

pub use auth::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use ids::*;
pub use operation::*;
pub use traits::*;

// Constants are accessed via `fisher_types::constants::FOO`
// (not re-exported to avoid name collisions).
