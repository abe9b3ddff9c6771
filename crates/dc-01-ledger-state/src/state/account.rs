//! # Account State Overlay
//!
//! Copy-on-write view of accounts, contract code and contract storage.
//! Reads fall through to the committed store; writes stay in the overlay
//! until [`AccountState::changes`] is committed with a block.
//!
//! [`AccountState::track`] forks a child overlay for speculative execution.
//! The child is folded back with [`AccountState::merge`] or simply dropped.

use crate::domain::{keys, LedgerResult};
use crate::ports::outbound::BatchOperation;
use crate::store::{put, LedgerStore};
use shared_types::{Account, Address, Amount, ArithmeticError, Hash};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountState {
    store: Arc<LedgerStore>,
    accounts: BTreeMap<Address, Account>,
    code: BTreeMap<Address, Vec<u8>>,
    storage: BTreeMap<(Address, Hash), Vec<u8>>,
}

impl AccountState {
    /// Empty overlay over the committed store.
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self {
            store,
            accounts: BTreeMap::new(),
            code: BTreeMap::new(),
            storage: BTreeMap::new(),
        }
    }

    /// Fork a child overlay.
    pub fn track(&self) -> Self {
        self.clone()
    }

    /// Fold a child overlay forked from `self` back in.
    pub fn merge(&mut self, track: AccountState) {
        self.accounts.extend(track.accounts);
        self.code.extend(track.code);
        self.storage.extend(track.storage);
    }

    /// Account at `address`; an empty account if it was never written.
    pub fn get_account(&self, address: &Address) -> LedgerResult<Account> {
        if let Some(account) = self.accounts.get(address) {
            return Ok(account.clone());
        }
        Ok(self
            .store
            .get_account(address)?
            .unwrap_or_else(|| Account::empty(*address)))
    }

    pub fn put_account(&mut self, account: Account) {
        self.accounts.insert(account.address, account);
    }

    fn update<F>(&mut self, address: &Address, f: F) -> LedgerResult<()>
    where
        F: FnOnce(&mut Account) -> Result<(), ArithmeticError>,
    {
        let mut account = self.get_account(address)?;
        f(&mut account)?;
        self.put_account(account);
        Ok(())
    }

    pub fn credit_available(&mut self, address: &Address, amount: Amount) -> LedgerResult<()> {
        self.update(address, |a| {
            a.available = a.available.checked_add(amount)?;
            Ok(())
        })
    }

    pub fn debit_available(&mut self, address: &Address, amount: Amount) -> LedgerResult<()> {
        self.update(address, |a| {
            a.available = a.available.checked_sub(amount)?;
            Ok(())
        })
    }

    pub fn credit_locked(&mut self, address: &Address, amount: Amount) -> LedgerResult<()> {
        self.update(address, |a| {
            a.locked = a.locked.checked_add(amount)?;
            Ok(())
        })
    }

    pub fn debit_locked(&mut self, address: &Address, amount: Amount) -> LedgerResult<()> {
        self.update(address, |a| {
            a.locked = a.locked.checked_sub(amount)?;
            Ok(())
        })
    }

    pub fn increase_nonce(&mut self, address: &Address) -> LedgerResult<()> {
        self.update(address, |a| {
            a.nonce = a.nonce.checked_add(1).ok_or(ArithmeticError::Overflow)?;
            Ok(())
        })
    }

    pub fn get_code(&self, address: &Address) -> LedgerResult<Option<Vec<u8>>> {
        if let Some(code) = self.code.get(address) {
            return Ok(Some(code.clone()));
        }
        self.store.get_code(address)
    }

    pub fn set_code(&mut self, address: Address, code: Vec<u8>) {
        self.code.insert(address, code);
    }

    pub fn get_storage(&self, address: &Address, slot: &Hash) -> LedgerResult<Option<Vec<u8>>> {
        if let Some(value) = self.storage.get(&(*address, *slot)) {
            return Ok(Some(value.clone()));
        }
        self.store.get_storage(address, slot)
    }

    pub fn put_storage(&mut self, address: Address, slot: Hash, value: Vec<u8>) {
        self.storage.insert((address, slot), value);
    }

    /// Whether the overlay holds any write.
    pub fn is_dirty(&self) -> bool {
        !(self.accounts.is_empty() && self.code.is_empty() && self.storage.is_empty())
    }

    /// Writes held by the overlay, as store operations.
    pub fn changes(&self) -> LedgerResult<Vec<BatchOperation>> {
        let mut ops = Vec::with_capacity(self.accounts.len() + self.code.len() + self.storage.len());
        for (address, account) in &self.accounts {
            ops.push(put(keys::account(address), account)?);
        }
        for (address, code) in &self.code {
            ops.push(put(keys::code(address), code)?);
        }
        for ((address, slot), value) in &self.storage {
            ops.push(put(keys::storage(address, slot), value)?);
        }
        Ok(ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKVStore;
    use crate::domain::LedgerError;

    fn state() -> AccountState {
        AccountState::new(Arc::new(LedgerStore::new(Arc::new(InMemoryKVStore::new()))))
    }

    const A: Address = [1u8; 20];

    #[test]
    fn test_unknown_account_is_empty() {
        let state = state();
        assert!(state.get_account(&A).unwrap().is_empty());
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_credit_and_debit() {
        let mut state = state();
        state.credit_available(&A, Amount::from_nano(100)).unwrap();
        state.debit_available(&A, Amount::from_nano(30)).unwrap();
        state.credit_locked(&A, Amount::from_nano(5)).unwrap();
        state.increase_nonce(&A).unwrap();

        let account = state.get_account(&A).unwrap();
        assert_eq!(account.available, Amount::from_nano(70));
        assert_eq!(account.locked, Amount::from_nano(5));
        assert_eq!(account.nonce, 1);
    }

    #[test]
    fn test_underflow_leaves_account_untouched() {
        let mut state = state();
        state.credit_available(&A, Amount::from_nano(10)).unwrap();
        let err = state.debit_available(&A, Amount::from_nano(11)).unwrap_err();
        assert!(matches!(err, LedgerError::Arithmetic(ArithmeticError::Underflow)));
        assert_eq!(state.get_account(&A).unwrap().available, Amount::from_nano(10));
    }

    #[test]
    fn test_track_is_isolated_until_merge() {
        let mut state = state();
        let mut track = state.track();
        track.credit_available(&A, Amount::ONE).unwrap();
        track.put_storage(A, [9u8; 32], vec![1]);

        assert!(state.get_account(&A).unwrap().is_empty());
        state.merge(track);
        assert_eq!(state.get_account(&A).unwrap().available, Amount::ONE);
        assert_eq!(state.get_storage(&A, &[9u8; 32]).unwrap(), Some(vec![1]));
        assert_eq!(state.changes().unwrap().len(), 2);
    }
}
