//! Compatibility layer reproducing how VM results were recorded before the
//! voting-precompile upgrade fork.

use crate::domain::rules::{GET_VOTES_PRECOMPILE, GET_VOTE_PRECOMPILE};
use crate::domain::{precompile_address, precompile_id};
use crate::ports::outbound::VmReceipt;
use dc_01_ledger_state::{AccountState, LedgerResult};
use shared_types::{ArithmeticError, ResultCode, Transaction, TransactionType};

/// How a VM receipt is recorded in the transaction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimOutcome {
    pub code: ResultCode,
    pub gas_used: u64,
    pub return_data: Vec<u8>,
}

pub struct LegacyPrecompileShim {
    upgraded: bool,
}

impl LegacyPrecompileShim {
    /// `upgraded` is whether the voting-precompile fork is active.
    pub fn new(upgraded: bool) -> Self {
        Self { upgraded }
    }

    /// Map `receipt` to a result, charging the sender any extra gas the
    /// legacy rules consume.
    ///
    /// Before the upgrade: the vote query precompiles always fail with all
    /// gas consumed, direct precompile calls always succeed, and reverted
    /// calls are not refunded.
    pub fn apply(
        &self,
        tx: &Transaction,
        receipt: &VmReceipt,
        accounts: &mut AccountState,
    ) -> LedgerResult<ShimOutcome> {
        let mut outcome = ShimOutcome {
            code: if receipt.success {
                ResultCode::Success
            } else {
                ResultCode::Failure
            },
            gas_used: receipt.gas_used,
            return_data: receipt.return_data.clone(),
        };
        if self.upgraded {
            return Ok(outcome);
        }

        let direct_precompile = tx.tx_type == TransactionType::Call && precompile_id(&tx.to).is_some();
        if direct_precompile
            && (tx.to == precompile_address(GET_VOTE_PRECOMPILE)
                || tx.to == precompile_address(GET_VOTES_PRECOMPILE))
        {
            outcome.code = ResultCode::Failure;
            outcome.return_data.clear();
            outcome.gas_used = tx.gas;
        }
        if direct_precompile {
            outcome.code = ResultCode::Success;
        }
        if !receipt.success {
            outcome.gas_used = tx.gas;
        }

        let extra_gas = outcome
            .gas_used
            .checked_sub(receipt.gas_used)
            .ok_or(ArithmeticError::Underflow)?;
        let delta = tx.gas_price.checked_mul(extra_gas)?;
        if !delta.is_zero() {
            accounts.debit_available(&tx.from, delta)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_01_ledger_state::{InMemoryKVStore, LedgerStore};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{Amount, Network, UnsignedTransaction};
    use std::sync::Arc;

    fn call(to: u8) -> Transaction {
        UnsignedTransaction::call(
            Network::Devnet,
            precompile_address(to),
            Amount::ZERO,
            0,
            0,
            Vec::new(),
            100_000,
            Amount::from_nano(2),
        )
        .sign(&Ed25519KeyPair::from_seed([7u8; 32]))
    }

    fn funded(tx: &Transaction) -> AccountState {
        let mut accounts =
            AccountState::new(Arc::new(LedgerStore::new(Arc::new(InMemoryKVStore::new()))));
        accounts.credit_available(&tx.from, Amount::from_nano(1_000_000)).unwrap();
        accounts
    }

    fn receipt(success: bool, gas_used: u64) -> VmReceipt {
        VmReceipt {
            success,
            gas_used,
            return_data: vec![1, 2, 3],
            ..VmReceipt::default()
        }
    }

    #[test]
    fn test_upgraded_passes_receipt_through() {
        let tx = call(102);
        let mut accounts = funded(&tx);
        let outcome = LegacyPrecompileShim::new(true)
            .apply(&tx, &receipt(true, 30_000), &mut accounts)
            .unwrap();
        assert_eq!(outcome.code, ResultCode::Success);
        assert_eq!(outcome.gas_used, 30_000);
        assert_eq!(outcome.return_data, vec![1, 2, 3]);
        assert_eq!(accounts.get_account(&tx.from).unwrap().available.nano(), 1_000_000);
    }

    #[test]
    fn test_legacy_vote_query_charges_full_gas() {
        let tx = call(103);
        let mut accounts = funded(&tx);
        let outcome = LegacyPrecompileShim::new(false)
            .apply(&tx, &receipt(true, 30_000), &mut accounts)
            .unwrap();
        // Marked successful as a direct precompile call, but all gas is used.
        assert_eq!(outcome.code, ResultCode::Success);
        assert!(outcome.return_data.is_empty());
        assert_eq!(outcome.gas_used, 100_000);
        assert_eq!(
            accounts.get_account(&tx.from).unwrap().available.nano(),
            1_000_000 - 2 * 70_000
        );
    }

    #[test]
    fn test_legacy_failure_is_not_refunded() {
        let mut tx = call(1);
        tx.to = [9u8; 20];
        let mut accounts = funded(&tx);
        let outcome = LegacyPrecompileShim::new(false)
            .apply(&tx, &receipt(false, 40_000), &mut accounts)
            .unwrap();
        assert_eq!(outcome.code, ResultCode::Failure);
        assert_eq!(outcome.gas_used, 100_000);
        assert_eq!(
            accounts.get_account(&tx.from).unwrap().available.nano(),
            1_000_000 - 2 * 60_000
        );
    }
}
