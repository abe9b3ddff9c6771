//! # dc-04-block-sync
//!
//! Block sync subsystem for Delegate-Chain.
//!
//! ## Role in System
//!
//! - **Catch-up**: when consensus sees two thirds of the validators ahead
//!   of it, the node pauses consensus and [`BlockSync`] downloads the
//!   missing blocks
//! - **Verification**: every block must carry a quorum of COMMIT votes
//!   from the validator set in force at its height, then pass the same
//!   validation and re-execution as a consensus proposal
//! - **Serving**: answers `GET_BLOCK` and `GET_BLOCK_HEADER` from peers
//!
//! ```text
//! [Peers] ──BLOCK──→ [DownloadQueue] ──in order──→ verify_commit_votes
//!    ↑                     │                              │
//!    └────GET_BLOCK────────┘                              ↓
//!                                            [BlockProcessor] ──→ [Blockchain]
//! ```
//!
//! ## Ordering
//!
//! Blocks are applied strictly by height. A downloaded block waits in the
//! queue until every lower height has been applied, and one that fails
//! its checks is fetched again from a different peer. Nothing that failed
//! a check ever reaches the chain.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::SyncConfig;
pub use domain::*;
pub use ports::*;
pub use service::{BlockSync, SyncRunner};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
