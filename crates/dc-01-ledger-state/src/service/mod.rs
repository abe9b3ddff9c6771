//! # Blockchain Facade
//!
//! Owns the committed chain: head cache, validator set, listeners and the
//! ledger read/write lock.
//!
//! ## Locking
//!
//! `commit_block` holds the write lock for the whole batch write, so a
//! reader holding [`Blockchain::acquire_read_lock`] never observes a
//! half-applied block. `close` takes the write lock before releasing the
//! store, which waits out any in-flight commit.

use crate::adapters::InMemoryKVStore;
use crate::domain::{
    compute_state_root, keys, select_validators, Genesis, LedgerError, LedgerResult,
};
use crate::ports::outbound::{BlockchainListener, KeyValueStore};
use crate::state::{AccountState, DelegateState};
use crate::store::{put, LedgerStore};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use shared_crypto::ZERO_HASH;
use shared_types::{
    short_hash, Account, Address, Block, BlockHeader, ChainSpec, Delegate, Hash,
    TransactionResult, ZERO_ADDRESS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Block 0 and the overlays holding its state, built over `store`.
fn build_genesis(
    genesis: &Genesis,
    store: Arc<LedgerStore>,
) -> LedgerResult<(Block, AccountState, DelegateState)> {
    let mut accounts = AccountState::new(Arc::clone(&store));
    let mut delegates = DelegateState::new(store);
    for premine in &genesis.premine {
        accounts.credit_available(&premine.address, premine.amount)?;
    }
    for delegate in &genesis.delegates {
        delegates.register(delegate.address, delegate.name.as_bytes(), 0)?;
    }

    let mut changes = accounts.changes()?;
    changes.extend(delegates.changes()?);
    let header = BlockHeader {
        height: 0,
        view: 0,
        coinbase: ZERO_ADDRESS,
        parent_hash: ZERO_HASH,
        timestamp: genesis.timestamp,
        transactions_root: ZERO_HASH,
        results_root: ZERO_HASH,
        state_root: compute_state_root(&ZERO_HASH, &changes),
        data: Vec::new(),
    };
    Ok((Block::new(header, Vec::new()), accounts, delegates))
}

pub struct Blockchain {
    store: Arc<LedgerStore>,
    spec: Arc<ChainSpec>,
    lock: RwLock<()>,
    latest: RwLock<Option<Block>>,
    validators: RwLock<Vec<Address>>,
    listeners: RwLock<Vec<Arc<dyn BlockchainListener>>>,
    closed: AtomicBool,
}

impl Blockchain {
    /// Open the chain stored in `kv`.
    pub fn new(kv: Arc<dyn KeyValueStore>, spec: Arc<ChainSpec>) -> LedgerResult<Self> {
        let store = Arc::new(LedgerStore::new(kv));
        let latest = store.latest_block()?;
        let validators = store.get_validators()?;
        if let Some(block) = &latest {
            info!(height = block.height(), validators = validators.len(), "Loaded chain");
        }
        Ok(Self {
            store,
            spec,
            lock: RwLock::new(()),
            latest: RwLock::new(latest),
            validators: RwLock::new(validators),
            listeners: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn spec(&self) -> &Arc<ChainSpec> {
        &self.spec
    }

    /// Commit block 0 from `genesis` unless the chain already has one.
    ///
    /// An existing chain must carry the same genesis block.
    pub fn initialize_genesis(&self, genesis: &Genesis) -> LedgerResult<Block> {
        if let Some(existing) = self.store.get_block(0)? {
            let scratch = Arc::new(LedgerStore::new(Arc::new(InMemoryKVStore::new())));
            let (expected, _, _) = build_genesis(genesis, scratch)?;
            if existing.hash() != expected.hash() {
                return Err(LedgerError::GenesisMismatch);
            }
            return Ok(existing);
        }

        let (block, accounts, delegates) = build_genesis(genesis, Arc::clone(&self.store))?;
        self.commit_block(block.clone(), Vec::new(), &accounts, &delegates)?;
        info!(
            hash = %short_hash(&block.hash()),
            premine = genesis.premine.len(),
            delegates = genesis.delegates.len(),
            "Genesis committed"
        );
        Ok(block)
    }

    /// Latest committed block.
    pub fn latest_block(&self) -> LedgerResult<Block> {
        self.latest.read().clone().ok_or(LedgerError::NotInitialized)
    }

    pub fn latest_header(&self) -> LedgerResult<BlockHeader> {
        Ok(self.latest_block()?.header)
    }

    /// Height of the latest committed block; zero before genesis.
    pub fn latest_height(&self) -> u64 {
        self.latest.read().as_ref().map_or(0, Block::height)
    }

    pub fn block(&self, height: u64) -> LedgerResult<Option<Block>> {
        self.store.get_block(height)
    }

    pub fn header(&self, height: u64) -> LedgerResult<Option<BlockHeader>> {
        self.store.get_block_header(height)
    }

    pub fn results(&self, height: u64) -> LedgerResult<Option<Vec<TransactionResult>>> {
        self.store.get_results(height)
    }

    pub fn has_transaction(&self, hash: &Hash) -> LedgerResult<bool> {
        self.store.has_transaction(hash)
    }

    pub fn account(&self, address: &Address) -> LedgerResult<Account> {
        Ok(self
            .store
            .get_account(address)?
            .unwrap_or_else(|| Account::empty(*address)))
    }

    pub fn delegate(&self, address: &Address) -> LedgerResult<Option<Delegate>> {
        self.store.get_delegate(address)
    }

    pub fn delegates(&self) -> LedgerResult<Vec<Delegate>> {
        self.store.list_delegates()
    }

    /// Validator set for the next height.
    pub fn validators(&self) -> Vec<Address> {
        self.validators.read().clone()
    }

    /// Fresh account overlay over committed state.
    pub fn track_account_state(&self) -> AccountState {
        AccountState::new(Arc::clone(&self.store))
    }

    /// Fresh delegate overlay over committed state.
    pub fn track_delegate_state(&self) -> DelegateState {
        DelegateState::new(Arc::clone(&self.store))
    }

    pub fn acquire_read_lock(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    pub fn acquire_write_lock(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }

    pub fn add_listener(&self, listener: Arc<dyn BlockchainListener>) {
        self.listeners.write().push(listener);
    }

    /// Atomically persist `block`, its results and the overlays that
    /// produced them, then notify listeners.
    ///
    /// The validator set is recomputed from the post-block delegate state
    /// when the height is a refresh boundary (and always for genesis).
    pub fn commit_block(
        &self,
        block: Block,
        results: Vec<TransactionResult>,
        accounts: &AccountState,
        delegates: &DelegateState,
    ) -> LedgerResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LedgerError::Closed);
        }
        let height = block.height();
        let hash = block.hash();

        {
            let _guard = self.lock.write();

            let head = self.latest.read().clone();
            match &head {
                Some(head) => {
                    if height != head.height() + 1 {
                        return Err(LedgerError::NonSequential {
                            expected: head.height() + 1,
                            actual: height,
                        });
                    }
                    if block.header.parent_hash != head.hash() {
                        return Err(LedgerError::ParentMismatch(height));
                    }
                }
                None if height != 0 => {
                    return Err(LedgerError::NonSequential {
                        expected: 0,
                        actual: height,
                    });
                }
                None => {}
            }

            let mut batch = accounts.changes()?;
            batch.extend(delegates.changes()?);
            for tx in &block.transactions {
                batch.push(put(keys::tx_index(&tx.hash), &height)?);
            }
            batch.push(put(keys::results(height), &results)?);
            batch.push(put(keys::block(height), &block)?);
            batch.push(put(keys::LATEST_HEIGHT.to_vec(), &height)?);

            let new_validators = if height == 0 || self.spec.is_validator_refresh_height(height) {
                let set = select_validators(delegates.list_delegates()?, self.spec.validator_count);
                batch.push(put(keys::VALIDATORS.to_vec(), &set)?);
                Some(set)
            } else {
                None
            };

            self.store.write(batch)?;

            *self.latest.write() = Some(block.clone());
            if let Some(set) = new_validators {
                debug!(height, validators = set.len(), "Validator set refreshed");
                *self.validators.write() = set;
            }
        }

        debug!(
            height,
            hash = %short_hash(&hash),
            txs = block.transactions.len(),
            "Block committed"
        );

        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_block_added(&block, &results);
        }
        Ok(())
    }

    /// Wait for in-flight writes, flush and release the store.
    pub fn close(&self) -> LedgerResult<()> {
        let _guard = self.lock.write();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.store.flush()?;
        self.store.close()?;
        info!("Ledger closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
