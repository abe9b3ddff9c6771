//! Key schema. Every table is a one-byte prefix in a single key space so
//! one atomic batch can span all of them.

use shared_types::{Address, Hash};

pub const ACCOUNT: u8 = 0x01;
pub const DELEGATE: u8 = 0x02;
pub const DELEGATE_NAME: u8 = 0x03;
pub const VOTE: u8 = 0x04;
pub const CODE: u8 = 0x05;
pub const STORAGE: u8 = 0x06;
pub const BLOCK: u8 = 0x10;
pub const RESULTS: u8 = 0x11;
pub const TX_INDEX: u8 = 0x12;
pub const META: u8 = 0x20;

/// Height of the latest committed block.
pub const LATEST_HEIGHT: [u8; 2] = [META, 0x01];
/// Current validator set.
pub const VALIDATORS: [u8; 2] = [META, 0x02];

fn key(prefix: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.push(prefix);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

pub fn account(address: &Address) -> Vec<u8> {
    key(ACCOUNT, &[address])
}

pub fn delegate(address: &Address) -> Vec<u8> {
    key(DELEGATE, &[address])
}

pub fn delegate_name(name: &[u8]) -> Vec<u8> {
    key(DELEGATE_NAME, &[name])
}

pub fn vote(voter: &Address, delegate: &Address) -> Vec<u8> {
    key(VOTE, &[voter, delegate])
}

pub fn code(address: &Address) -> Vec<u8> {
    key(CODE, &[address])
}

pub fn storage(address: &Address, slot: &Hash) -> Vec<u8> {
    key(STORAGE, &[address, slot])
}

pub fn block(height: u64) -> Vec<u8> {
    key(BLOCK, &[&height.to_be_bytes()])
}

pub fn results(height: u64) -> Vec<u8> {
    key(RESULTS, &[&height.to_be_bytes()])
}

pub fn tx_index(hash: &Hash) -> Vec<u8> {
    key(TX_INDEX, &[hash])
}
