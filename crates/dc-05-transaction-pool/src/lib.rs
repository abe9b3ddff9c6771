//! # dc-05-transaction-pool
//!
//! Pending transaction pool for Delegate-Chain.
//!
//! ## Role in System
//!
//! - **Admission**: validates format, signature, network and timestamp of
//!   every transaction received from peers or the local submitter
//! - **Speculative execution**: each admitted transaction is executed on
//!   an overlay of the head state, so only transactions that would apply
//!   cleanly are kept
//! - **Proposal source**: [`TransactionPoolApi::pending_transactions`]
//!   hands the proposer a gas-bounded prefix in insertion order
//!
//! ```text
//! [Gossip / Submitter] ──add_transaction──→ [TransactionPool]
//!                                               │      ↑
//!                                  pending_txs  │      │ on_block_added
//!                                               ↓      │
//!                                          [Consensus] [Blockchain]
//! ```
//!
//! After every committed block the pool rebuilds its overlays on the new
//! head and re-admits the survivors in their original order.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::SystemTimeSource;
pub use config::PoolConfig;
pub use domain::*;
pub use ports::*;
pub use service::TransactionPool;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
