//! # RocksDB Storage Adapter
//!
//! RocksDB implementation of the ledger's [`KeyValueStore`] port.
//!
//! ## Features
//!
//! - Atomic batch writes (WriteBatch), one per committed block
//! - Snappy compression and bloom filters
//! - Optional fsync on every batch
//! - Writes refused once free disk space drops below a floor

use dc_01_ledger_state::{BatchOperation, KeyValueStore, LedgerError, LedgerResult, ScanResult};
use parking_lot::RwLock;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::path::PathBuf;

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// fsync every batch
    pub sync_writes: bool,
    /// Refuse writes below this much free space on the data volume
    pub min_free_bytes: u64,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/ledger"),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
            min_free_bytes: 512 * 1024 * 1024,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
            min_free_bytes: 0,
        }
    }
}

fn storage_error(op: &str, e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(format!("RocksDB {op} failed: {e}"))
}

/// RocksDB-backed ledger store.
pub struct RocksDbStore {
    db: RwLock<Option<DB>>,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create the database at `config.path`.
    pub fn open(config: RocksDbConfig) -> LedgerResult<Self> {
        std::fs::create_dir_all(&config.path).map_err(|e| storage_error("create dir", e))?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| storage_error("open", e))?;
        Ok(Self {
            db: RwLock::new(Some(db)),
            config,
        })
    }

    fn with_db<T>(&self, op: impl FnOnce(&DB) -> LedgerResult<T>) -> LedgerResult<T> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(LedgerError::Closed)?;
        op(db)
    }

    fn check_disk_space(&self) -> LedgerResult<()> {
        if self.config.min_free_bytes == 0 {
            return Ok(());
        }
        let available =
            fs2::available_space(&self.config.path).map_err(|e| storage_error("statvfs", e))?;
        if available < self.config.min_free_bytes {
            return Err(LedgerError::Storage(format!(
                "only {available} bytes free on the ledger volume"
            )));
        }
        Ok(())
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        self.with_db(|db| db.get(key).map_err(|e| storage_error("get", e)))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> LedgerResult<()> {
        self.check_disk_space()?;
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);

        self.with_db(|db| {
            db.write_opt(batch, &write_opts)
                .map_err(|e| storage_error("batch write", e))
        })
    }

    fn prefix_scan(&self, prefix: &[u8]) -> LedgerResult<ScanResult> {
        self.with_db(|db| {
            let mut results = Vec::new();
            for item in db.iterator(IteratorMode::From(prefix, rocksdb::Direction::Forward)) {
                let (key, value) = item.map_err(|e| storage_error("scan", e))?;
                if !key.starts_with(prefix) {
                    break;
                }
                results.push((key.to_vec(), value.to_vec()));
            }
            Ok(results)
        })
    }

    fn flush(&self) -> LedgerResult<()> {
        self.with_db(|db| db.flush().map_err(|e| storage_error("flush", e)))
    }

    fn close(&self) -> LedgerResult<()> {
        // Dropping the handle closes the database.
        drop(self.db.write().take());
        Ok(())
    }
}
