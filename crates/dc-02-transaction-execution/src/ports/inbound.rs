//! Block-level execution API used by consensus and sync.

use crate::domain::ExecutionResult;
use crate::service::ExecutedBlock;
use shared_types::{Address, Block, Transaction, Vote};

pub trait BlockExecution: Send + Sync {
    /// Build a candidate block on the chain head from `pending`, keeping
    /// only transactions whose results are acceptable.
    fn build_block(
        &self,
        coinbase: Address,
        view: u32,
        timestamp: u64,
        pending: Vec<Transaction>,
    ) -> ExecutionResult<ExecutedBlock>;

    /// Check `block` against the chain head and re-execute it.
    fn validate_block(&self, block: &Block, now: u64) -> ExecutionResult<ExecutedBlock>;

    /// Commit an executed block with the votes that finalized it.
    fn import_block(&self, executed: ExecutedBlock, votes: Vec<Vote>) -> ExecutionResult<()>;
}
