//! # Inbound Port - TransactionPoolApi
//!
//! Driving port used by transaction gossip, the local submitter and the
//! proposer.

use crate::domain::PoolResult;
use shared_types::{Hash, Transaction, TransactionResult};

pub trait TransactionPoolApi: Send + Sync {
    /// Validate `tx`, execute it on the pending state and keep it if the
    /// result is acceptable.
    ///
    /// # Errors
    /// - `Invalid`: bad hash, signature, sender or network
    /// - `TimestampDrift`: more than the configured drift from local time
    /// - `Duplicate` / `AlreadyOnChain`: seen before
    /// - `VmDisabled`: CREATE/CALL before the VM fork
    /// - `AmountLimit` / `CountLimit`: VOTE/UNVOTE limits
    /// - `PoolFull`: at capacity
    /// - `Rejected`: execution produced an unacceptable result code
    fn add_transaction(&self, tx: Transaction) -> PoolResult<TransactionResult>;

    /// Pooled transactions in execution order, cut at `gas_limit`.
    fn pending_transactions(&self, gas_limit: u64) -> Vec<Transaction>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, hash: &Hash) -> bool;
}
