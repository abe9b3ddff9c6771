//! # Outbound Ports
//!
//! What the ledger needs from its environment: a key-value engine with
//! atomic batches, and observers notified after each commit.

use crate::domain::LedgerResult;
use shared_types::{Block, TransactionResult};

/// Single write in an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Key touched by the operation.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Key/value pairs from a prefix scan, in key order.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract key-value engine.
///
/// Production uses RocksDB; tests use [`crate::InMemoryKVStore`].
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>>;

    /// Apply every operation or none.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> LedgerResult<()>;

    /// All entries whose key starts with `prefix`, ordered by key.
    fn prefix_scan(&self, prefix: &[u8]) -> LedgerResult<ScanResult>;

    /// Persist buffered writes.
    fn flush(&self) -> LedgerResult<()>;

    /// Release the underlying handles. Further calls fail.
    fn close(&self) -> LedgerResult<()>;
}

/// Observer of committed blocks. Called after the write lock is released.
pub trait BlockchainListener: Send + Sync {
    fn on_block_added(&self, block: &Block, results: &[TransactionResult]);
}
