//! # Adapter Implementations
//!
//! Glue between subsystems: each adapter implements an outbound port of
//! one subsystem on top of another subsystem's service.
//!
//! ```text
//! [BftEngine] ──PendingTransactions──→ PoolProposals ──→ [TransactionPool]
//! [BftRunner] ──SyncService──────────→ BlockSyncService ──→ [BlockSync]
//! [Blockchain] ──KeyValueStore───────→ InMemoryKVStore | RocksDbStore
//! ```

pub mod consensus;
pub mod mempool;
pub mod storage;

pub use consensus::BlockSyncService;
pub use mempool::PoolProposals;
pub use storage::open_store;
