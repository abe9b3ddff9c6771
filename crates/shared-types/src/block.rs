//! # Blocks
//!
//! A block is immutable once hashed. Identity is the hash of the header,
//! which commits to the transaction list through `transactions_root`.
//! Finalized blocks carry the COMMIT votes that justified them so a syncing
//! node can check finality without replaying consensus.

use crate::chain_spec::Fork;
use crate::codec::Encoder;
use crate::consensus::Vote;
use crate::entities::{Address, Hash};
use crate::errors::CodecError;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use shared_crypto::{blake3_hash, merkle_root};

/// Maximum size of the header extension data.
pub const MAX_HEADER_DATA_SIZE: usize = 32;

/// Current header-data version byte.
pub const HEADER_DATA_VERSION: u8 = 0x01;

/// Decoded header extension data: a version byte and the set of forks the
/// proposer signals support for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHeaderData {
    /// Forks signalled by the proposer, in ascending id order.
    pub signals: Vec<Fork>,
}

impl BlockHeaderData {
    /// Header data signalling `signals`.
    pub fn new(mut signals: Vec<Fork>) -> Self {
        signals.sort();
        signals.dedup();
        Self { signals }
    }

    /// Encode as `version || count || id(u16 BE)*`. No signals encodes empty.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.signals.is_empty() {
            return Ok(Vec::new());
        }
        let mut encoder = Encoder::new();
        encoder.write_u8(HEADER_DATA_VERSION);
        encoder.write_u8(self.signals.len().min(u8::MAX as usize) as u8);
        for fork in &self.signals {
            encoder.write_fixed(&fork.id().to_be_bytes());
        }
        let bytes = encoder.finish();
        if bytes.len() > MAX_HEADER_DATA_SIZE {
            return Err(CodecError::HeaderDataTooLarge {
                size: bytes.len(),
                max: MAX_HEADER_DATA_SIZE,
            });
        }
        Ok(bytes)
    }

    /// Decode header data. Unknown fork ids are skipped.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        if bytes.len() > MAX_HEADER_DATA_SIZE {
            return Err(CodecError::HeaderDataTooLarge {
                size: bytes.len(),
                max: MAX_HEADER_DATA_SIZE,
            });
        }
        if bytes[0] != HEADER_DATA_VERSION {
            return Err(CodecError::Decode(format!(
                "unknown header data version {}",
                bytes[0]
            )));
        }
        let count = *bytes
            .get(1)
            .ok_or_else(|| CodecError::Decode("missing signal count".into()))?
            as usize;
        let body = &bytes[2..];
        if body.len() != count * 2 {
            return Err(CodecError::Decode("signal list length mismatch".into()));
        }
        let signals = body
            .chunks_exact(2)
            .filter_map(|chunk| Fork::from_id(u16::from_be_bytes([chunk[0], chunk[1]])))
            .collect();
        Ok(Self::new(signals))
    }

    /// Whether `fork` is signalled.
    pub fn signals(&self, fork: Fork) -> bool {
        self.signals.contains(&fork)
    }
}

/// Block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    /// View in which the block was proposed.
    pub view: u32,
    pub coinbase: Address,
    pub parent_hash: Hash,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub transactions_root: Hash,
    pub results_root: Hash,
    pub state_root: Hash,
    /// Encoded [`BlockHeaderData`], at most [`MAX_HEADER_DATA_SIZE`] bytes.
    pub data: Vec<u8>,
}

impl BlockHeader {
    /// Identity hash of the header.
    pub fn hash(&self) -> Hash {
        let preimage = Encoder::new()
            .write_u64(self.height)
            .write_u32(self.view)
            .write_fixed(&self.coinbase)
            .write_fixed(&self.parent_hash)
            .write_u64(self.timestamp)
            .write_fixed(&self.transactions_root)
            .write_fixed(&self.results_root)
            .write_fixed(&self.state_root)
            .write_bytes(&self.data)
            .finish();
        blake3_hash(&preimage)
    }

    /// Decoded header extension data.
    pub fn header_data(&self) -> Result<BlockHeaderData, CodecError> {
        BlockHeaderData::decode(&self.data)
    }
}

/// A block: header, ordered transactions and the finality votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    /// COMMIT votes justifying finality. Empty for genesis and candidates.
    pub votes: Vec<Vote>,
}

impl Block {
    /// Assemble a block without finality votes.
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
            votes: Vec::new(),
        }
    }

    /// Identity hash.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Block height.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Merkle root over the transaction hashes.
    pub fn compute_transactions_root(transactions: &[Transaction]) -> Hash {
        let leaves: Vec<Hash> = transactions.iter().map(|tx| tx.hash).collect();
        merkle_root(&leaves)
    }

    /// Whether `transactions_root` matches the carried transactions.
    pub fn transactions_root_matches(&self) -> bool {
        Self::compute_transactions_root(&self.transactions) == self.header.transactions_root
    }

    /// Copy of the block carrying `votes` as its finality proof.
    pub fn with_votes(mut self, votes: Vec<Vote>) -> Self {
        self.votes = votes;
        self
    }
}
