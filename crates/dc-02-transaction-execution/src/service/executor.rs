//! # Transaction Executor
//!
//! Applies transactions one by one to account and delegate overlays and
//! yields exactly one [`TransactionResult`] per input.
//!
//! Every check runs before the first write, so a rejected transaction leaves
//! the overlays untouched. Amount overflow degrades the transaction to
//! `INVALID`; only ledger I/O failures abort the batch.

use crate::domain::rules::vm_gas_in_bounds;
use crate::domain::{validate_delegate_name, BlockContext, ExecutionResult};
use crate::ports::outbound::VmExecutor;
use crate::service::shim::LegacyPrecompileShim;
use dc_01_ledger_state::{AccountState, DelegateState, LedgerError, LedgerResult};
use shared_types::{
    short_hash, Amount, ArithmeticError, ChainSpec, Fork, ResultCode, Transaction,
    TransactionResult, TransactionType, DELEGATE_BURN_ADDRESS,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TransactionExecutor {
    spec: Arc<ChainSpec>,
    vm: Arc<dyn VmExecutor>,
}

impl TransactionExecutor {
    pub fn new(spec: Arc<ChainSpec>, vm: Arc<dyn VmExecutor>) -> Self {
        Self { spec, vm }
    }

    pub fn spec(&self) -> &Arc<ChainSpec> {
        &self.spec
    }

    /// Execute `txs` in order inside the block described by `ctx`.
    ///
    /// `gas_used_in_block` is the gas already consumed by earlier
    /// transactions of the same block.
    pub fn execute(
        &self,
        txs: &[Transaction],
        accounts: &mut AccountState,
        delegates: &mut DelegateState,
        ctx: &BlockContext,
        mut gas_used_in_block: u64,
    ) -> ExecutionResult<Vec<TransactionResult>> {
        let mut results = Vec::with_capacity(txs.len());

        for tx in txs {
            let mut result =
                match self.execute_one(tx, accounts, delegates, ctx, gas_used_in_block) {
                    Ok(result) => result,
                    Err(LedgerError::Arithmetic(error)) => {
                        warn!(tx = %short_hash(&tx.hash), %error, "Arithmetic failure during execution");
                        TransactionResult::new(ResultCode::Invalid)
                    }
                    Err(e) => return Err(e.into()),
                };

            if result.is_acceptable() {
                if tx.is_vm_transaction() {
                    gas_used_in_block = gas_used_in_block.saturating_add(result.gas_used);
                } else {
                    accounts.increase_nonce(&tx.from)?;
                    gas_used_in_block =
                        gas_used_in_block.saturating_add(self.spec.non_vm_transaction_gas_cost);
                }
            } else {
                debug!(
                    tx = %short_hash(&tx.hash),
                    tx_type = tx.tx_type.name(),
                    code = ?result.code,
                    "Transaction rejected"
                );
            }

            result.block_number = ctx.height;
            results.push(result);
        }

        Ok(results)
    }

    fn execute_one(
        &self,
        tx: &Transaction,
        accounts: &mut AccountState,
        delegates: &mut DelegateState,
        ctx: &BlockContext,
        gas_used_in_block: u64,
    ) -> LedgerResult<TransactionResult> {
        let account = accounts.get_account(&tx.from)?;

        if tx.nonce != account.nonce {
            return rejected(ResultCode::InvalidNonce);
        }
        account.nonce.checked_add(1).ok_or(ArithmeticError::Overflow)?;

        if tx.is_vm_transaction() {
            if !tx.fee.is_zero()
                || !vm_gas_in_bounds(tx.gas, tx.gas_price, self.spec.max_block_gas_limit)
            {
                return rejected(ResultCode::InvalidFee);
            }
        } else if tx.fee < self.spec.min_transaction_fee {
            return rejected(ResultCode::InvalidFee);
        }

        if tx.data.len() > self.spec.max_transaction_data_size(tx.tx_type) {
            return rejected(ResultCode::InvalidData);
        }

        if !tx.is_vm_transaction()
            && gas_used_in_block.saturating_add(self.spec.non_vm_transaction_gas_cost) > ctx.gas_limit
        {
            return rejected(ResultCode::Invalid);
        }

        let available = account.available;
        let locked = account.locked;
        let code = match tx.tx_type {
            TransactionType::Transfer => {
                let total = tx.value.checked_add(tx.fee)?;
                if total > available {
                    ResultCode::InsufficientAvailable
                } else {
                    move_available(accounts, tx, total)?;
                    ResultCode::Success
                }
            }
            TransactionType::Delegate => {
                if !validate_delegate_name(&tx.data) {
                    ResultCode::InvalidDelegateName
                } else if tx.value < self.spec.min_delegate_burn_amount {
                    ResultCode::InvalidDelegateBurnAmount
                } else if tx.to != DELEGATE_BURN_ADDRESS {
                    ResultCode::InvalidDelegateBurnAddress
                } else {
                    let total = tx.value.checked_add(tx.fee)?;
                    if total > available {
                        ResultCode::InsufficientAvailable
                    } else {
                        // Credit check first so registration never lands alone.
                        accounts
                            .get_account(&tx.to)?
                            .available
                            .checked_add(tx.value)?;
                        if delegates.register(tx.from, &tx.data, ctx.height)? {
                            move_available(accounts, tx, total)?;
                            ResultCode::Success
                        } else {
                            ResultCode::InvalidDelegating
                        }
                    }
                }
            }
            TransactionType::Vote => {
                let total = tx.value.checked_add(tx.fee)?;
                if total > available {
                    ResultCode::InsufficientAvailable
                } else {
                    let new_locked = locked.checked_add(tx.value)?;
                    if delegates.vote(&tx.from, &tx.to, tx.value)? {
                        let mut account = account.clone();
                        account.available = available.checked_sub(total)?;
                        account.locked = new_locked;
                        accounts.put_account(account);
                        ResultCode::Success
                    } else {
                        ResultCode::InvalidVoting
                    }
                }
            }
            TransactionType::Unvote => {
                if available < tx.fee {
                    ResultCode::InsufficientAvailable
                } else if locked < tx.value {
                    ResultCode::InsufficientLocked
                } else {
                    let new_available = available.checked_sub(tx.fee)?.checked_add(tx.value)?;
                    if delegates.unvote(&tx.from, &tx.to, tx.value)? {
                        let mut account = account.clone();
                        account.available = new_available;
                        account.locked = locked.checked_sub(tx.value)?;
                        accounts.put_account(account);
                        ResultCode::Success
                    } else {
                        ResultCode::InvalidUnvoting
                    }
                }
            }
            TransactionType::Create | TransactionType::Call => {
                return self.execute_vm(tx, accounts, delegates, ctx, gas_used_in_block);
            }
            TransactionType::Coinbase | TransactionType::Reward | TransactionType::Burn => {
                ResultCode::InvalidType
            }
        };

        Ok(TransactionResult::new(code))
    }

    /// Run a CREATE or CALL on tracked overlays, merged back only when the
    /// VM produced a receipt.
    fn execute_vm(
        &self,
        tx: &Transaction,
        accounts: &mut AccountState,
        delegates: &mut DelegateState,
        ctx: &BlockContext,
        gas_used_in_block: u64,
    ) -> LedgerResult<TransactionResult> {
        let mut account_track = accounts.track();
        let mut delegate_track = delegates.track();

        let Some(receipt) = self.vm.execute(
            tx,
            ctx,
            &mut account_track,
            &mut delegate_track,
            gas_used_in_block,
        )?
        else {
            return Ok(TransactionResult::new(ResultCode::Invalid));
        };

        let upgraded = self
            .spec
            .is_fork_active(Fork::VotingPrecompiledUpgrade, ctx.height);
        let outcome = LegacyPrecompileShim::new(upgraded).apply(tx, &receipt, &mut account_track)?;

        accounts.merge(account_track);
        delegates.merge(delegate_track);

        let mut result = TransactionResult::new(outcome.code);
        result.set_gas(tx.gas, tx.gas_price, outcome.gas_used);
        result.return_data = outcome.return_data;
        result.logs = receipt.logs;
        result.internal_transactions = receipt.internal_transactions;
        Ok(result)
    }
}

fn rejected(code: ResultCode) -> LedgerResult<TransactionResult> {
    Ok(TransactionResult::new(code))
}

/// Debit `total` from the sender and credit `tx.value` to `tx.to`.
///
/// Callers have checked `total <= available`. The recipient credit is
/// computed before anything is written.
fn move_available(accounts: &mut AccountState, tx: &Transaction, total: Amount) -> LedgerResult<()> {
    if tx.from == tx.to {
        let mut account = accounts.get_account(&tx.from)?;
        account.available = account.available.checked_sub(total)?.checked_add(tx.value)?;
        accounts.put_account(account);
        return Ok(());
    }
    let mut recipient = accounts.get_account(&tx.to)?;
    recipient.available = recipient.available.checked_add(tx.value)?;
    accounts.debit_available(&tx.from, total)?;
    accounts.put_account(recipient);
    Ok(())
}
