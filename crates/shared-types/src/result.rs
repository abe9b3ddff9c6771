//! # Transaction Results
//!
//! One result per executed transaction. The results root of a block commits
//! to each result's merkle encoding (code, return data, logs).

use crate::amount::Amount;
use crate::codec::Encoder;
use crate::entities::{Address, Hash};
use serde::{Deserialize, Serialize};
use shared_crypto::{blake3_hash, merkle_root};

/// Outcome of executing a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResultCode {
    /// Executed successfully.
    Success = 0x00,
    /// VM execution reverted or failed; the transaction is still included.
    Failure = 0x01,
    /// Generic rejection (block gas exhausted, arithmetic overflow, no receipt).
    Invalid = 0x20,
    InvalidFormat = 0x21,
    InvalidTimestamp = 0x22,
    InvalidType = 0x23,
    InvalidNonce = 0x24,
    InvalidFee = 0x25,
    InvalidData = 0x27,
    InsufficientAvailable = 0x28,
    InsufficientLocked = 0x29,
    InvalidDelegating = 0x2a,
    InvalidDelegateName = 0x2b,
    InvalidDelegateBurnAddress = 0x2c,
    InvalidDelegateBurnAmount = 0x2d,
    InvalidVoting = 0x2e,
    InvalidUnvoting = 0x2f,
    /// Already in the pool or the chain.
    Duplicated = 0x30,
}

impl ResultCode {
    /// `Success` and `Failure` may be included in a block.
    pub fn is_acceptable(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// Only `Success`.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// An event emitted by contract execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInfo {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

/// A value transfer or call made by a contract during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalTransaction {
    /// Hash of the top-level transaction.
    pub root_tx_hash: Hash,
    pub depth: u32,
    pub index: u32,
    pub kind: String,
    pub from: Address,
    pub to: Address,
    pub nonce: u64,
    pub value: Amount,
    pub data: Vec<u8>,
    pub gas: u64,
    pub gas_price: Amount,
    pub rejected: bool,
}

/// Result of executing one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub code: ResultCode,
    pub return_data: Vec<u8>,
    pub logs: Vec<LogInfo>,
    /// Gas limit declared by the transaction (VM only).
    pub gas: u64,
    pub gas_price: Amount,
    /// Gas consumed (VM only).
    pub gas_used: u64,
    pub block_number: u64,
    pub internal_transactions: Vec<InternalTransaction>,
}

impl Default for TransactionResult {
    fn default() -> Self {
        Self::new(ResultCode::Success)
    }
}

impl TransactionResult {
    /// A result with `code` and no VM output.
    pub fn new(code: ResultCode) -> Self {
        Self {
            code,
            return_data: Vec::new(),
            logs: Vec::new(),
            gas: 0,
            gas_price: Amount::ZERO,
            gas_used: 0,
            block_number: 0,
            internal_transactions: Vec::new(),
        }
    }

    /// Whether the result may be included in a block.
    pub fn is_acceptable(&self) -> bool {
        self.code.is_acceptable()
    }

    /// Record VM gas accounting.
    pub fn set_gas(&mut self, gas: u64, gas_price: Amount, gas_used: u64) {
        self.gas = gas;
        self.gas_price = gas_price;
        self.gas_used = gas_used;
    }

    /// Gas fee paid to the coinbase: `gas_price * gas_used`.
    pub fn gas_fee(&self) -> Option<Amount> {
        self.gas_price.checked_mul(self.gas_used).ok()
    }

    /// Bytes committed by the results root.
    pub fn merkle_encoding(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_u8(self.code as u8).write_bytes(&self.return_data);
        encoder.write_u32(self.logs.len() as u32);
        for log in &self.logs {
            encoder.write_fixed(&log.address);
            encoder.write_u32(log.topics.len() as u32);
            for topic in &log.topics {
                encoder.write_fixed(topic);
            }
            encoder.write_bytes(&log.data);
        }
        encoder.finish()
    }

    /// Merkle root over the hashes of `results`' merkle encodings.
    pub fn compute_results_root(results: &[TransactionResult]) -> Hash {
        let leaves: Vec<Hash> = results
            .iter()
            .map(|result| blake3_hash(&result.merkle_encoding()))
            .collect();
        merkle_root(&leaves)
    }
}
