//! # dc-03-consensus
//!
//! BFT Consensus subsystem for Delegate-Chain.
//!
//! ## Role in System
//!
//! - **Primary selection**: [`PrimarySelector`] picks the proposer of each
//!   `(height, view)`, legacy or uniform depending on the fork schedule
//! - **Vote tallying**: [`VoteSet`] counts signed votes against the
//!   validator set and excludes equivocators
//! - **State machine**: [`BftEngine`] runs
//!   `NEW_HEIGHT → PROPOSE → VALIDATE → PRE_COMMIT → COMMIT → FINALIZE`
//!   with view changes on timeout
//! - **Event loop**: [`BftRunner`] drives the engine on a tokio task and
//!   hands control to block sync when the node falls behind
//!
//! ```text
//! [Channel] ──message──→ [BftHandle] ──mpsc──→ [BftRunner] ──→ [BftEngine]
//!                                                   │               │
//!                                    [SyncService] ←┘               ├──→ [ConsensusChain]
//!                                                                   └──→ [Channel] broadcast
//! ```
//!
//! ## Safety
//!
//! A block is finalized only with `floor(2n/3) + 1` COMMIT votes at one
//! view. A node that sent its COMMIT vote never votes for another block at
//! the same height.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{ManualClock, NoPendingTransactions, SystemClock};
pub use config::BftConfig;
pub use domain::*;
pub use ports::*;
pub use service::{BftDependencies, BftEngine, BftHandle, BftRunner};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
