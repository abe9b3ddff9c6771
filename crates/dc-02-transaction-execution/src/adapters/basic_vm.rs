//! # Basic VM
//!
//! A minimal [`VmExecutor`] for networks without a contract engine. It
//! stores deployed code and moves value, serves the precompiled contracts,
//! and keeps the same gas and nonce accounting any VM must follow:
//!
//! 1. The whole `gas * gas_price` is prepaid and the nonce is bumped.
//! 2. The call runs on a tracked overlay, dropped on failure.
//! 3. A failed call consumes all gas; unused gas is refunded.
//!
//! Deployed code is never interpreted. A call to a contract account records
//! its input in storage and emits one log.

use crate::domain::rules::{GET_VOTES_PRECOMPILE, GET_VOTE_PRECOMPILE};
use crate::domain::{precompile_id, BlockContext};
use crate::ports::outbound::{VmExecutor, VmReceipt};
use dc_01_ledger_state::{AccountState, DelegateState, LedgerResult};
use shared_crypto::{blake3_hash, blake3_hash_many, ZERO_HASH};
use shared_types::{
    Address, Amount, InternalTransaction, LogInfo, Transaction, TransactionType,
};
use tracing::trace;

pub const TX_GAS: u64 = 21_000;
pub const CREATE_GAS: u64 = 32_000;
pub const CODE_DEPOSIT_GAS_PER_BYTE: u64 = 200;
pub const ZERO_BYTE_GAS: u64 = 4;
pub const NON_ZERO_BYTE_GAS: u64 = 16;
pub const PRECOMPILE_GAS: u64 = 3_000;
pub const VOTING_PRECOMPILE_GAS: u64 = 20_000;
pub const STORAGE_WRITE_GAS: u64 = 5_000;

const VOTE_PRECOMPILE: u8 = 100;
const UNVOTE_PRECOMPILE: u8 = 101;

/// Why a call failed; all gas is consumed.
struct Revert;

#[derive(Debug, Default, Clone, Copy)]
pub struct BasicVm;

impl BasicVm {
    pub fn new() -> Self {
        Self
    }

    /// Address of the contract deployed by `creator` at `nonce`.
    pub fn contract_address(creator: &Address, nonce: u64) -> Address {
        let hash = blake3_hash_many(&[creator.as_slice(), &nonce.to_be_bytes()[..]]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[..20]);
        address
    }

    /// Gas charged before any code runs.
    pub fn intrinsic_gas(tx: &Transaction) -> u64 {
        let data_gas: u64 = tx
            .data
            .iter()
            .map(|b| if *b == 0 { ZERO_BYTE_GAS } else { NON_ZERO_BYTE_GAS })
            .sum();
        let mut gas = TX_GAS.saturating_add(data_gas);
        if tx.tx_type == TransactionType::Create {
            gas = gas
                .saturating_add(CREATE_GAS)
                .saturating_add(CODE_DEPOSIT_GAS_PER_BYTE.saturating_mul(tx.data.len() as u64));
        }
        gas
    }

    fn run(
        &self,
        tx: &Transaction,
        accounts: &mut AccountState,
        delegates: &mut DelegateState,
        output: &mut VmReceipt,
    ) -> LedgerResult<Result<(), Revert>> {
        let mut gas = Self::intrinsic_gas(tx);

        let target = if tx.tx_type == TransactionType::Create {
            let address = Self::contract_address(&tx.from, tx.nonce);
            if accounts.get_code(&address)?.is_some() {
                return Ok(Err(Revert));
            }
            accounts.set_code(address, tx.data.clone());
            address
        } else {
            tx.to
        };

        if !tx.value.is_zero() {
            let sender = accounts.get_account(&tx.from)?;
            if sender.available < tx.value {
                return Ok(Err(Revert));
            }
            accounts.debit_available(&tx.from, tx.value)?;
            accounts.credit_available(&target, tx.value)?;
        }

        if tx.tx_type == TransactionType::Call {
            if let Some(id) = precompile_id(&tx.to) {
                gas = gas.saturating_add(if id >= VOTE_PRECOMPILE {
                    VOTING_PRECOMPILE_GAS
                } else {
                    PRECOMPILE_GAS
                });
                match run_precompile(id, tx, accounts, delegates, output)? {
                    Ok(()) => {}
                    Err(revert) => return Ok(Err(revert)),
                }
            } else if accounts.get_code(&tx.to)?.is_some() {
                gas = gas.saturating_add(STORAGE_WRITE_GAS);
                accounts.put_storage(tx.to, ZERO_HASH, tx.data.clone());
                output.logs.push(LogInfo {
                    address: tx.to,
                    topics: vec![blake3_hash(&tx.data)],
                    data: tx.data.clone(),
                });
            }
        }

        if gas > tx.gas {
            return Ok(Err(Revert));
        }
        output.gas_used = gas;
        Ok(Ok(()))
    }
}

fn amount_word(amount: Amount) -> Vec<u8> {
    let mut word = vec![0u8; 32];
    word[24..].copy_from_slice(&amount.nano().to_be_bytes());
    word
}

fn read_address(data: &[u8], offset: usize) -> Option<Address> {
    data.get(offset..offset + 20)?.try_into().ok()
}

fn read_amount(data: &[u8], offset: usize) -> Option<Amount> {
    let bytes: [u8; 8] = data.get(offset..offset + 8)?.try_into().ok()?;
    Some(Amount::from_nano(u64::from_be_bytes(bytes)))
}

/// Precompiles 1 to 8 hash their input. 100 and 101 vote and unvote for the
/// caller (`delegate ++ amount`), 102 reads one vote (`voter ++ delegate`)
/// and 103 reads a delegate's total (`delegate`).
fn run_precompile(
    id: u8,
    tx: &Transaction,
    accounts: &mut AccountState,
    delegates: &mut DelegateState,
    output: &mut VmReceipt,
) -> LedgerResult<Result<(), Revert>> {
    match id {
        VOTE_PRECOMPILE | UNVOTE_PRECOMPILE => {
            let (Some(delegate), Some(amount)) = (read_address(&tx.data, 0), read_amount(&tx.data, 20))
            else {
                return Ok(Err(Revert));
            };
            let account = accounts.get_account(&tx.from)?;
            let applied = if id == VOTE_PRECOMPILE {
                account.available >= amount
                    && account.locked.checked_add(amount).is_ok()
                    && delegates.vote(&tx.from, &delegate, amount)?
            } else {
                account.locked >= amount
                    && account.available.checked_add(amount).is_ok()
                    && delegates.unvote(&tx.from, &delegate, amount)?
            };
            if !applied {
                return Ok(Err(Revert));
            }
            if id == VOTE_PRECOMPILE {
                accounts.debit_available(&tx.from, amount)?;
                accounts.credit_locked(&tx.from, amount)?;
            } else {
                accounts.debit_locked(&tx.from, amount)?;
                accounts.credit_available(&tx.from, amount)?;
            }
            output.internal_transactions.push(InternalTransaction {
                root_tx_hash: tx.hash,
                depth: 1,
                index: 0,
                kind: if id == VOTE_PRECOMPILE { "VOTE" } else { "UNVOTE" }.to_string(),
                from: tx.from,
                to: delegate,
                nonce: tx.nonce,
                value: amount,
                data: Vec::new(),
                gas: 0,
                gas_price: tx.gas_price,
                rejected: false,
            });
        }
        GET_VOTE_PRECOMPILE => {
            let (Some(voter), Some(delegate)) = (read_address(&tx.data, 0), read_address(&tx.data, 20))
            else {
                return Ok(Err(Revert));
            };
            output.return_data = amount_word(delegates.get_vote(&voter, &delegate)?);
        }
        GET_VOTES_PRECOMPILE => {
            let Some(delegate) = read_address(&tx.data, 0) else {
                return Ok(Err(Revert));
            };
            let votes = delegates
                .get_delegate(&delegate)?
                .map_or(Amount::ZERO, |d| d.votes);
            output.return_data = amount_word(votes);
        }
        _ => output.return_data = blake3_hash(&tx.data).to_vec(),
    }
    Ok(Ok(()))
}

impl VmExecutor for BasicVm {
    fn execute(
        &self,
        tx: &Transaction,
        ctx: &BlockContext,
        accounts: &mut AccountState,
        delegates: &mut DelegateState,
        gas_used_in_block: u64,
    ) -> LedgerResult<Option<VmReceipt>> {
        if gas_used_in_block.saturating_add(tx.gas) > ctx.gas_limit {
            return Ok(None);
        }
        let Ok(prepaid) = tx.gas_price.checked_mul(tx.gas) else {
            return Ok(None);
        };
        let sender = accounts.get_account(&tx.from)?;
        if sender.available < prepaid || sender.nonce != tx.nonce {
            return Ok(None);
        }
        accounts.debit_available(&tx.from, prepaid)?;
        accounts.increase_nonce(&tx.from)?;

        let mut account_track = accounts.track();
        let mut delegate_track = delegates.track();
        let mut receipt = VmReceipt::default();
        match self.run(tx, &mut account_track, &mut delegate_track, &mut receipt)? {
            Ok(()) => {
                accounts.merge(account_track);
                delegates.merge(delegate_track);
                receipt.success = true;
            }
            Err(Revert) => {
                receipt = VmReceipt {
                    gas_used: tx.gas,
                    ..VmReceipt::default()
                };
            }
        }

        let refund = tx.gas_price.checked_mul(tx.gas - receipt.gas_used)?;
        accounts.credit_available(&tx.from, refund)?;
        trace!(
            success = receipt.success,
            gas_used = receipt.gas_used,
            "VM transaction executed"
        );
        Ok(Some(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::precompile_address;
    use dc_01_ledger_state::{InMemoryKVStore, LedgerStore};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{Network, UnsignedTransaction};
    use std::sync::Arc;

    fn overlays() -> (AccountState, DelegateState) {
        let store = Arc::new(LedgerStore::new(Arc::new(InMemoryKVStore::new())));
        (AccountState::new(Arc::clone(&store)), DelegateState::new(store))
    }

    fn ctx() -> BlockContext {
        BlockContext {
            height: 1,
            coinbase: [0u8; 20],
            parent_hash: [0u8; 32],
            timestamp: 0,
            gas_limit: 1_000_000,
        }
    }

    fn key() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed([3u8; 32])
    }

    #[test]
    fn test_create_deploys_code_and_refunds() {
        let (mut accounts, mut delegates) = overlays();
        let tx = UnsignedTransaction::create(
            Network::Devnet,
            Amount::from_nano(10),
            0,
            0,
            vec![0x60, 0x00],
            200_000,
            Amount::ONE,
        )
        .sign(&key());
        accounts.credit_available(&tx.from, Amount::from_nano(500_000)).unwrap();

        let receipt = BasicVm::new()
            .execute(&tx, &ctx(), &mut accounts, &mut delegates, 0)
            .unwrap()
            .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.gas_used, BasicVm::intrinsic_gas(&tx));

        let contract = BasicVm::contract_address(&tx.from, 0);
        assert_eq!(accounts.get_code(&contract).unwrap(), Some(vec![0x60, 0x00]));
        assert_eq!(accounts.get_account(&contract).unwrap().available.nano(), 10);
        let sender = accounts.get_account(&tx.from).unwrap();
        assert_eq!(sender.nonce, 1);
        assert_eq!(sender.available.nano(), 500_000 - 10 - receipt.gas_used);
    }

    #[test]
    fn test_out_of_gas_consumes_everything() {
        let (mut accounts, mut delegates) = overlays();
        let tx = UnsignedTransaction::call(
            Network::Devnet,
            [5u8; 20],
            Amount::from_nano(10),
            0,
            0,
            vec![1; 100],
            21_000,
            Amount::ONE,
        )
        .sign(&key());
        accounts.credit_available(&tx.from, Amount::from_nano(100_000)).unwrap();

        let receipt = BasicVm::new()
            .execute(&tx, &ctx(), &mut accounts, &mut delegates, 0)
            .unwrap()
            .unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(accounts.get_account(&[5u8; 20]).unwrap().available, Amount::ZERO);
        assert_eq!(
            accounts.get_account(&tx.from).unwrap().available.nano(),
            100_000 - 21_000
        );
    }

    #[test]
    fn test_unfunded_gas_is_rejected_without_writes() {
        let (mut accounts, mut delegates) = overlays();
        let tx = UnsignedTransaction::call(
            Network::Devnet,
            [5u8; 20],
            Amount::ZERO,
            0,
            0,
            Vec::new(),
            21_000,
            Amount::ONE,
        )
        .sign(&key());
        let receipt = BasicVm::new()
            .execute(&tx, &ctx(), &mut accounts, &mut delegates, 0)
            .unwrap();
        assert!(receipt.is_none());
        assert!(!accounts.is_dirty());

        accounts.credit_available(&tx.from, Amount::from_nano(21_000)).unwrap();
        let receipt = BasicVm::new()
            .execute(&tx, &ctx(), &mut accounts, &mut delegates, 990_000)
            .unwrap();
        assert!(receipt.is_none(), "block gas exhausted");
    }

    #[test]
    fn test_vote_precompiles() {
        let (mut accounts, mut delegates) = overlays();
        let delegate = [8u8; 20];
        delegates.register(delegate, b"eight", 0).unwrap();

        let mut data = delegate.to_vec();
        data.extend_from_slice(&40u64.to_be_bytes());
        let vote = UnsignedTransaction::call(
            Network::Devnet,
            precompile_address(100),
            Amount::ZERO,
            0,
            0,
            data,
            100_000,
            Amount::ONE,
        )
        .sign(&key());
        accounts.credit_available(&vote.from, Amount::from_nano(1_000_000)).unwrap();
        let receipt = BasicVm::new()
            .execute(&vote, &ctx(), &mut accounts, &mut delegates, 0)
            .unwrap()
            .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.internal_transactions.len(), 1);
        assert_eq!(accounts.get_account(&vote.from).unwrap().locked.nano(), 40);

        let query = UnsignedTransaction::call(
            Network::Devnet,
            precompile_address(103),
            Amount::ZERO,
            1,
            0,
            delegate.to_vec(),
            100_000,
            Amount::ONE,
        )
        .sign(&key());
        let receipt = BasicVm::new()
            .execute(&query, &ctx(), &mut accounts, &mut delegates, 0)
            .unwrap()
            .unwrap();
        assert_eq!(receipt.return_data, amount_word(Amount::from_nano(40)));
    }
}
