//! # Shared Types Crate
//!
//! Ledger entities, transactions, blocks, consensus and sync wire messages,
//! and the immutable [`ChainSpec`] used across all subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-subsystem types are defined here.
//! - **Immutable identity**: transactions and blocks are identified by the
//!   hash of a canonical, fixed-width/length-prefixed preimage.
//! - **Checked money**: [`Amount`] arithmetic never wraps.

pub mod amount;
pub mod block;
pub mod chain_spec;
pub mod codec;
pub mod consensus;
pub mod entities;
pub mod errors;
pub mod messages;
pub mod result;
pub mod signature;
pub mod transaction;

pub use amount::{unit, Amount, ArithmeticError};
pub use block::{Block, BlockHeader, BlockHeaderData, MAX_HEADER_DATA_SIZE};
pub use chain_spec::{ChainSpec, Fork, ForkActivation, ForkSchedule};
pub use consensus::{Proof, Proposal, Vote, VoteType};
pub use entities::*;
pub use errors::*;
pub use messages::{ConsensusMessage, DisconnectReason, Message, SyncMessage};
pub use result::{InternalTransaction, LogInfo, ResultCode, TransactionResult};
pub use signature::Signature;
pub use transaction::{Transaction, TransactionType, UnsignedTransaction};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
