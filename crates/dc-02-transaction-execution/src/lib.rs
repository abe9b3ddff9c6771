//! # dc-02-transaction-execution
//!
//! Transaction Execution subsystem for Delegate-Chain.
//!
//! ## Role in System
//!
//! - **State transition**: [`TransactionExecutor`] applies a batch of
//!   transactions to ledger overlays and yields one result per transaction
//! - **VM seam**: CREATE and CALL are delegated to a [`VmExecutor`];
//!   [`BasicVm`] is the in-tree implementation
//! - **Block processing**: [`BlockProcessor`] builds proposals, validates
//!   received blocks by re-execution and commits them
//!
//! ```text
//! [Consensus / Sync] ──validate_block──→ [BlockProcessor] ──execute──→ [TransactionExecutor]
//!                                              │                              │
//!                                              └──commit_block──→ [Blockchain] └──→ [VmExecutor]
//! ```
//!
//! ## Determinism
//!
//! Execution reads only the overlays, the block context and the chain
//! spec. Two nodes executing the same block on the same parent state reach
//! the same results and state root.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::BasicVm;
pub use config::ProcessorConfig;
pub use domain::*;
pub use ports::*;
pub use service::{BlockProcessor, ExecutedBlock, LegacyPrecompileShim, ShimOutcome, TransactionExecutor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
