//! Outbound (driven) ports of the pool.

use crate::domain::PoolResult;
use dc_01_ledger_state::{AccountState, DelegateState};
use dc_02_transaction_execution::BlockContext;
use parking_lot::RwLockReadGuard;
use shared_types::{BlockHeader, ChainSpec, Hash, Transaction, TransactionResult};

/// Chain access and speculative execution.
pub trait PoolChain: Send + Sync {
    fn spec(&self) -> &ChainSpec;

    /// Shared ledger lock. Held while reading the head and executing on
    /// overlays of its state, so no block commits in between.
    fn acquire_read_lock(&self) -> RwLockReadGuard<'_, ()>;

    fn latest_header(&self) -> PoolResult<BlockHeader>;

    fn has_transaction(&self, hash: &Hash) -> PoolResult<bool>;

    fn track_account_state(&self) -> AccountState;

    fn track_delegate_state(&self) -> DelegateState;

    /// Execute one transaction on the overlays inside `ctx`.
    fn execute(
        &self,
        tx: &Transaction,
        accounts: &mut AccountState,
        delegates: &mut DelegateState,
        ctx: &BlockContext,
    ) -> PoolResult<TransactionResult>;
}

/// Time source for consistent timestamp handling.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now(&self) -> u64;
}
