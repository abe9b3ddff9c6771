//! # dc-01-ledger-state
//!
//! Ledger State subsystem for Delegate-Chain.
//!
//! ## Role in System
//!
//! - **Single Source of Truth**: committed accounts, delegates, vote ledger,
//!   contract code/storage, blocks and transaction results
//! - **Speculative execution**: [`AccountState`]/[`DelegateState`] overlays
//!   let the executor, consensus, sync and the pool run transactions without
//!   touching committed state
//! - **Atomic commit**: a block and every state change it causes land in one
//!   key-value batch under the ledger write lock
//!
//! ```text
//! [Consensus / Sync] ──commit_block──→ [Blockchain] ──batch──→ [KeyValueStore]
//!                                           │
//!                                           └──on_block_added──→ [Listeners]
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;
pub mod state;
pub mod store;

pub use adapters::InMemoryKVStore;
pub use domain::*;
pub use ports::*;
pub use service::Blockchain;
pub use state::{AccountState, DelegateState};
pub use store::LedgerStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
