//! # Ledger Storage Backends
//!
//! In memory by default. With the `rocksdb` feature and a configured data
//! directory the ledger lives in RocksDB.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

use crate::container::StorageConfig;
use dc_01_ledger_state::{InMemoryKVStore, KeyValueStore, LedgerResult};
use std::sync::Arc;
use tracing::info;

/// Open the key-value engine described by `config`.
pub fn open_store(config: &StorageConfig) -> LedgerResult<Arc<dyn KeyValueStore>> {
    match &config.data_dir {
        #[cfg(feature = "rocksdb")]
        Some(dir) => {
            let store = RocksDbStore::open(RocksDbConfig {
                path: dir.clone(),
                sync_writes: config.sync_writes,
                ..RocksDbConfig::default()
            })?;
            info!(path = ?dir, "Opened persistent ledger");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "rocksdb"))]
        Some(_) => Err(dc_01_ledger_state::LedgerError::Storage(
            "built without the rocksdb feature".to_string(),
        )),
        None => {
            info!("Using in-memory ledger");
            Ok(Arc::new(InMemoryKVStore::new()))
        }
    }
}
