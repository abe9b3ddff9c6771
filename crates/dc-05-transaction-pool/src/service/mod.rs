//! # Transaction Pool Service
//!
//! Pending transactions are executed as they arrive on overlays of the
//! head state, so the pool always holds a sequence that applies cleanly
//! on top of the chain in insertion order.
//!
//! Lock order is the ledger read lock, then the pool state.

use crate::config::PoolConfig;
use crate::domain::{check_time_drift, check_vm_enabled, check_vote_limits, PoolError, PoolResult};
use crate::ports::{PoolChain, TimeSource, TransactionPoolApi};
use dc_01_ledger_state::{AccountState, BlockchainListener, DelegateState};
use dc_02_transaction_execution::BlockContext;
use parking_lot::Mutex;
use shared_types::{short_hash, Block, Hash, Transaction, TransactionResult, ZERO_ADDRESS};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};


struct PendingTransaction {
    tx: Transaction,
    result: TransactionResult,
}

struct PoolState {
    accounts: AccountState,
    delegates: DelegateState,
    /// Context of the block the pool is filling.
    ctx: BlockContext,
    pending: Vec<PendingTransaction>,
    hashes: HashSet<Hash>,
}

pub struct TransactionPool {
    config: PoolConfig,
    chain: Arc<dyn PoolChain>,
    clock: Arc<dyn TimeSource>,
    state: Mutex<PoolState>,
}

impl TransactionPool {
    /// Create an empty pool on the current chain head.
    pub fn new(
        config: PoolConfig,
        chain: Arc<dyn PoolChain>,
        clock: Arc<dyn TimeSource>,
    ) -> PoolResult<Self> {
        let state = Self::fresh_state(&config, chain.as_ref(), clock.as_ref())?;
        Ok(Self {
            config,
            chain,
            clock,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn fresh_state(
        config: &PoolConfig,
        chain: &dyn PoolChain,
        clock: &dyn TimeSource,
    ) -> PoolResult<PoolState> {
        let head = chain.latest_header()?;
        let ctx = BlockContext {
            height: head.height + 1,
            coinbase: ZERO_ADDRESS,
            parent_hash: head.hash(),
            timestamp: clock.now().max(head.timestamp + 1),
            gas_limit: config.block_gas_limit,
        };
        Ok(PoolState {
            accounts: chain.track_account_state(),
            delegates: chain.track_delegate_state(),
            ctx,
            pending: Vec::new(),
            hashes: HashSet::new(),
        })
    }

    /// Stateful admission and speculative execution.
    fn admit(&self, state: &mut PoolState, tx: Transaction) -> PoolResult<TransactionResult> {
        if state.hashes.contains(&tx.hash) {
            return Err(PoolError::Duplicate(tx.hash));
        }
        if self.chain.has_transaction(&tx.hash)? {
            return Err(PoolError::AlreadyOnChain(tx.hash));
        }
        let spec = self.chain.spec();
        check_vm_enabled(&tx, spec, state.ctx.height)?;
        let same_kind = state
            .pending
            .iter()
            .filter(|p| p.tx.from == tx.from && p.tx.tx_type == tx.tx_type)
            .count();
        check_vote_limits(&tx, spec, u32::try_from(same_kind).unwrap_or(u32::MAX))?;
        if state.pending.len() >= self.config.max_transactions {
            return Err(PoolError::PoolFull {
                capacity: self.config.max_transactions,
            });
        }

        let result =
            self.chain
                .execute(&tx, &mut state.accounts, &mut state.delegates, &state.ctx)?;
        if !result.is_acceptable() {
            return Err(PoolError::Rejected(result.code));
        }

        state.hashes.insert(tx.hash);
        state.pending.push(PendingTransaction {
            tx,
            result: result.clone(),
        });
        Ok(result)
    }

    fn try_add(&self, tx: Transaction) -> PoolResult<TransactionResult> {
        tx.validate(self.chain.spec().network)?;
        check_time_drift(
            &tx,
            self.clock.now(),
            self.config.max_transaction_time_drift_ms,
        )?;
        let _chain = self.chain.acquire_read_lock();
        let mut state = self.state.lock();
        self.admit(&mut state, tx)
    }

    /// Rebuild the pending state on the new head and re-admit whatever is
    /// still valid. Included and invalidated transactions are dropped.
    pub fn reset(&self) -> PoolResult<()> {
        let _chain = self.chain.acquire_read_lock();
        let fresh = Self::fresh_state(&self.config, self.chain.as_ref(), self.clock.as_ref())?;
        let mut state = self.state.lock();
        let previous = std::mem::replace(&mut *state, fresh);

        let total = previous.pending.len();
        let mut kept = 0usize;
        for pending in previous.pending {
            let hash = pending.tx.hash;
            match self.admit(&mut state, pending.tx) {
                Ok(_) => kept += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!(tx = %short_hash(&hash), reason = %e, "Dropped from pool"),
            }
        }
        if total > 0 {
            info!(
                height = state.ctx.height,
                kept,
                dropped = total - kept,
                "Pool reset"
            );
        }
        Ok(())
    }
}

impl TransactionPoolApi for TransactionPool {
    fn add_transaction(&self, tx: Transaction) -> PoolResult<TransactionResult> {
        let hash = tx.hash;
        let admitted = self.try_add(tx);

        match &admitted {
            Ok(result) => debug!(tx = %short_hash(&hash), code = ?result.code, "Transaction pooled"),
            Err(e) => debug!(tx = %short_hash(&hash), code = ?e.code(), reason = %e, "Transaction refused"),
        }
        admitted
    }

    fn pending_transactions(&self, gas_limit: u64) -> Vec<Transaction> {
        let limit = gas_limit.min(self.config.block_gas_limit);
        let non_vm_cost = self.chain.spec().non_vm_transaction_gas_cost;
        let state = self.state.lock();

        let mut gas_used = 0u64;
        let mut selected = Vec::new();
        for pending in &state.pending {
            let gas = if pending.tx.is_vm_transaction() {
                pending.result.gas_used
            } else {
                non_vm_cost
            };
            match gas_used.checked_add(gas) {
                Some(total) if total <= limit => gas_used = total,
                _ => break,
            }
            selected.push(pending.tx.clone());
        }
        selected
    }

    fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.state.lock().hashes.contains(hash)
    }
}

impl BlockchainListener for TransactionPool {
    fn on_block_added(&self, block: &Block, _results: &[TransactionResult]) {
        if let Err(e) = self.reset() {
            error!(height = block.height(), error = %e, "Pool reset failed");
        }
    }
}
