//! Collaborators the executor needs.

use crate::domain::BlockContext;
use dc_01_ledger_state::{AccountState, DelegateState, LedgerResult};
use shared_types::{InternalTransaction, LogInfo, Transaction};

/// What the VM reports after running a CREATE or CALL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmReceipt {
    pub success: bool,
    pub gas_used: u64,
    pub return_data: Vec<u8>,
    pub logs: Vec<LogInfo>,
    pub internal_transactions: Vec<InternalTransaction>,
}

/// Smart-contract execution capability.
///
/// The VM owns all balance, nonce and gas accounting of the transactions it
/// runs, including the nonce increment. It must leave the overlays untouched
/// when it returns `None`, and must discard a failed call's storage writes
/// itself while still charging gas.
pub trait VmExecutor: Send + Sync {
    /// Run `tx` against the overlays.
    ///
    /// `None` means the transaction cannot run at all (gas prepayment not
    /// covered, block gas exhausted) and is rejected.
    fn execute(
        &self,
        tx: &Transaction,
        ctx: &BlockContext,
        accounts: &mut AccountState,
        delegates: &mut DelegateState,
        gas_used_in_block: u64,
    ) -> LedgerResult<Option<VmReceipt>>;
}
