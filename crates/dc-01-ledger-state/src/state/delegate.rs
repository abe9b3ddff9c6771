//! # Delegate State Overlay
//!
//! Copy-on-write view of delegates, the name index and the vote ledger.
//!
//! Invariant: a delegate's `votes` equals the sum of the vote-ledger entries
//! pointing at it. Both sides are always updated together.

use crate::domain::{keys, LedgerResult};
use crate::ports::outbound::BatchOperation;
use crate::store::{put, LedgerStore};
use shared_types::{Address, Amount, Delegate};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct DelegateState {
    store: Arc<LedgerStore>,
    delegates: BTreeMap<Address, Delegate>,
    names: BTreeMap<Vec<u8>, Address>,
    /// `(voter, delegate) -> amount`
    votes: BTreeMap<(Address, Address), Amount>,
}

impl DelegateState {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self {
            store,
            delegates: BTreeMap::new(),
            names: BTreeMap::new(),
            votes: BTreeMap::new(),
        }
    }

    /// Fork a child overlay.
    pub fn track(&self) -> Self {
        self.clone()
    }

    /// Fold a child overlay forked from `self` back in.
    pub fn merge(&mut self, track: DelegateState) {
        self.delegates.extend(track.delegates);
        self.names.extend(track.names);
        self.votes.extend(track.votes);
    }

    pub fn get_delegate(&self, address: &Address) -> LedgerResult<Option<Delegate>> {
        if let Some(delegate) = self.delegates.get(address) {
            return Ok(Some(delegate.clone()));
        }
        self.store.get_delegate(address)
    }

    pub fn get_delegate_by_name(&self, name: &[u8]) -> LedgerResult<Option<Delegate>> {
        let address = match self.names.get(name) {
            Some(address) => Some(*address),
            None => self.store.get_delegate_by_name(name)?,
        };
        match address {
            Some(address) => self.get_delegate(&address),
            None => Ok(None),
        }
    }

    /// Register `address` as a delegate under `name`.
    ///
    /// Returns `false` without mutation when the address is already a
    /// delegate or the name is taken.
    pub fn register(&mut self, address: Address, name: &[u8], height: u64) -> LedgerResult<bool> {
        if self.get_delegate(&address)?.is_some() || self.get_delegate_by_name(name)?.is_some() {
            return Ok(false);
        }
        self.names.insert(name.to_vec(), address);
        self.delegates
            .insert(address, Delegate::new(address, name.to_vec(), height));
        Ok(true)
    }

    /// Amount `voter` has voted for `delegate`.
    pub fn get_vote(&self, voter: &Address, delegate: &Address) -> LedgerResult<Amount> {
        if let Some(amount) = self.votes.get(&(*voter, *delegate)) {
            return Ok(*amount);
        }
        self.store.get_vote(voter, delegate)
    }

    /// Add `value` votes from `voter` to `delegate`.
    ///
    /// Returns `false` when `delegate` is not registered. Overflow surfaces
    /// as [`crate::LedgerError::Arithmetic`] with nothing written.
    pub fn vote(&mut self, voter: &Address, delegate: &Address, value: Amount) -> LedgerResult<bool> {
        let Some(mut record) = self.get_delegate(delegate)? else {
            return Ok(false);
        };
        let entry = self.get_vote(voter, delegate)?.checked_add(value)?;
        record.votes = record.votes.checked_add(value)?;

        self.votes.insert((*voter, *delegate), entry);
        self.delegates.insert(*delegate, record);
        Ok(true)
    }

    /// Remove `value` votes from `voter` to `delegate`.
    ///
    /// Returns `false` when `delegate` is not registered or the voter has
    /// fewer than `value` votes for it.
    pub fn unvote(&mut self, voter: &Address, delegate: &Address, value: Amount) -> LedgerResult<bool> {
        let Some(mut record) = self.get_delegate(delegate)? else {
            return Ok(false);
        };
        let current = self.get_vote(voter, delegate)?;
        if current < value {
            return Ok(false);
        }
        let entry = current.checked_sub(value)?;
        record.votes = record.votes.checked_sub(value)?;

        self.votes.insert((*voter, *delegate), entry);
        self.delegates.insert(*delegate, record);
        Ok(true)
    }

    /// Every delegate visible through the overlay, in address order.
    pub fn list_delegates(&self) -> LedgerResult<Vec<Delegate>> {
        let mut all: BTreeMap<Address, Delegate> = self
            .store
            .list_delegates()?
            .into_iter()
            .map(|d| (d.address, d))
            .collect();
        all.extend(self.delegates.iter().map(|(a, d)| (*a, d.clone())));
        Ok(all.into_values().collect())
    }

    pub fn is_dirty(&self) -> bool {
        !(self.delegates.is_empty() && self.votes.is_empty())
    }

    /// Writes held by the overlay, as store operations.
    pub fn changes(&self) -> LedgerResult<Vec<BatchOperation>> {
        let mut ops = Vec::with_capacity(self.delegates.len() + self.names.len() + self.votes.len());
        for (address, delegate) in &self.delegates {
            ops.push(put(keys::delegate(address), delegate)?);
        }
        for (name, address) in &self.names {
            ops.push(put(keys::delegate_name(name), address)?);
        }
        for ((voter, delegate), amount) in &self.votes {
            ops.push(put(keys::vote(voter, delegate), amount)?);
        }
        Ok(ops)
    }
}
