//! [`PoolChain`] over the block processor.

use crate::domain::{PoolError, PoolResult};
use crate::ports::PoolChain;
use dc_01_ledger_state::{AccountState, DelegateState};
use dc_02_transaction_execution::{BlockContext, BlockProcessor};
use parking_lot::RwLockReadGuard;
use shared_types::{BlockHeader, ChainSpec, Hash, ResultCode, Transaction, TransactionResult};

impl PoolChain for BlockProcessor {
    fn spec(&self) -> &ChainSpec {
        self.chain().spec()
    }

    fn acquire_read_lock(&self) -> RwLockReadGuard<'_, ()> {
        self.chain().acquire_read_lock()
    }

    fn latest_header(&self) -> PoolResult<BlockHeader> {
        Ok(self.chain().latest_header()?)
    }

    fn has_transaction(&self, hash: &Hash) -> PoolResult<bool> {
        Ok(self.chain().has_transaction(hash)?)
    }

    fn track_account_state(&self) -> AccountState {
        self.chain().track_account_state()
    }

    fn track_delegate_state(&self) -> DelegateState {
        self.chain().track_delegate_state()
    }

    fn execute(
        &self,
        tx: &Transaction,
        accounts: &mut AccountState,
        delegates: &mut DelegateState,
        ctx: &BlockContext,
    ) -> PoolResult<TransactionResult> {
        let mut results = self
            .executor()
            .execute(std::slice::from_ref(tx), accounts, delegates, ctx, 0)?;
        results
            .pop()
            .ok_or(PoolError::Rejected(ResultCode::Invalid))
    }
}
