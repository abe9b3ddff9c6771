//! # Ledger Store
//!
//! Typed tables over the [`KeyValueStore`] port. Values are bincode-encoded
//! with the shared wire codec.

use crate::domain::{keys, LedgerResult};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::codec::{decode, encode};
use shared_types::{Account, Address, Amount, Block, BlockHeader, Delegate, Hash, TransactionResult};
use std::sync::Arc;

/// Encode a put operation.
pub fn put<T: Serialize>(key: Vec<u8>, value: &T) -> LedgerResult<BatchOperation> {
    Ok(BatchOperation::Put {
        key,
        value: encode(value)?,
    })
}

/// Typed access to the ledger tables.
pub struct LedgerStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LedgerStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn read<T: DeserializeOwned>(&self, key: &[u8]) -> LedgerResult<Option<T>> {
        match self.kv.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_account(&self, address: &Address) -> LedgerResult<Option<Account>> {
        self.read(&keys::account(address))
    }

    pub fn get_delegate(&self, address: &Address) -> LedgerResult<Option<Delegate>> {
        self.read(&keys::delegate(address))
    }

    /// Address registered under `name`.
    pub fn get_delegate_by_name(&self, name: &[u8]) -> LedgerResult<Option<Address>> {
        self.read(&keys::delegate_name(name))
    }

    /// Every registered delegate, in address order.
    pub fn list_delegates(&self) -> LedgerResult<Vec<Delegate>> {
        self.kv
            .prefix_scan(&[keys::DELEGATE])?
            .into_iter()
            .map(|(_, value)| decode(&value).map_err(Into::into))
            .collect()
    }

    /// Amount `voter` has voted for `delegate`; zero when absent.
    pub fn get_vote(&self, voter: &Address, delegate: &Address) -> LedgerResult<Amount> {
        Ok(self.read(&keys::vote(voter, delegate))?.unwrap_or(Amount::ZERO))
    }

    pub fn get_code(&self, address: &Address) -> LedgerResult<Option<Vec<u8>>> {
        self.read(&keys::code(address))
    }

    pub fn get_storage(&self, address: &Address, slot: &Hash) -> LedgerResult<Option<Vec<u8>>> {
        self.read(&keys::storage(address, slot))
    }

    pub fn get_block(&self, height: u64) -> LedgerResult<Option<Block>> {
        self.read(&keys::block(height))
    }

    pub fn get_block_header(&self, height: u64) -> LedgerResult<Option<BlockHeader>> {
        Ok(self.get_block(height)?.map(|block| block.header))
    }

    pub fn get_results(&self, height: u64) -> LedgerResult<Option<Vec<TransactionResult>>> {
        self.read(&keys::results(height))
    }

    /// Height of the latest committed block, if any.
    pub fn latest_height(&self) -> LedgerResult<Option<u64>> {
        self.read(&keys::LATEST_HEIGHT)
    }

    pub fn latest_block(&self) -> LedgerResult<Option<Block>> {
        match self.latest_height()? {
            Some(height) => self.get_block(height),
            None => Ok(None),
        }
    }

    /// Whether a committed block contains the transaction.
    pub fn has_transaction(&self, hash: &Hash) -> LedgerResult<bool> {
        Ok(self.kv.get(&keys::tx_index(hash))?.is_some())
    }

    /// Height of the block containing the transaction.
    pub fn transaction_height(&self, hash: &Hash) -> LedgerResult<Option<u64>> {
        self.read(&keys::tx_index(hash))
    }

    pub fn get_validators(&self) -> LedgerResult<Vec<Address>> {
        Ok(self.read(&keys::VALIDATORS)?.unwrap_or_default())
    }

    /// Apply a batch atomically.
    pub fn write(&self, operations: Vec<BatchOperation>) -> LedgerResult<()> {
        self.kv.atomic_batch_write(operations)
    }

    pub fn flush(&self) -> LedgerResult<()> {
        self.kv.flush()
    }

    pub fn close(&self) -> LedgerResult<()> {
        self.kv.close()
    }
}
