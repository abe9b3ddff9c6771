//! # Consensus Wire Types
//!
//! Votes, proofs and proposals. Every signed item is tagged with its
//! `(height, view)` so replay across heights or views is rejected by the
//! receiver.

use crate::block::Block;
use crate::codec::Encoder;
use crate::entities::{Address, Hash};
use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use shared_crypto::Ed25519KeyPair;
use std::fmt;

/// Voting phase of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteType {
    Validate = 0,
    PreCommit = 1,
    Commit = 2,
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "VALIDATE",
            Self::PreCommit => "PRE_COMMIT",
            Self::Commit => "COMMIT",
        };
        f.write_str(name)
    }
}

/// A signed vote for a block hash, or nil.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub vote_type: VoteType,
    pub height: u64,
    pub view: u32,
    /// `None` is a nil (reject) vote.
    pub block_hash: Option<Hash>,
    pub signature: Signature,
}

impl Vote {
    fn signing_bytes(vote_type: VoteType, height: u64, view: u32, block_hash: Option<Hash>) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder
            .write_u8(vote_type as u8)
            .write_u64(height)
            .write_u32(view)
            .write_bool(block_hash.is_some());
        if let Some(hash) = block_hash {
            encoder.write_fixed(&hash);
        }
        encoder.finish()
    }

    /// Create and sign a vote.
    pub fn new(
        vote_type: VoteType,
        height: u64,
        view: u32,
        block_hash: Option<Hash>,
        keypair: &Ed25519KeyPair,
    ) -> Self {
        let bytes = Self::signing_bytes(vote_type, height, view, block_hash);
        Self {
            vote_type,
            height,
            view,
            block_hash,
            signature: Signature::sign(keypair, &bytes),
        }
    }

    /// Whether the signature covers the vote fields.
    pub fn verify(&self) -> bool {
        self.signature.verify(&Self::signing_bytes(
            self.vote_type,
            self.height,
            self.view,
            self.block_hash,
        ))
    }

    /// Address of the voter.
    pub fn voter(&self) -> Address {
        self.signature.signer()
    }

    /// Whether this approves a block.
    pub fn is_approve(&self) -> bool {
        self.block_hash.is_some()
    }
}

/// Votes justifying a transition at `(height, view)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub height: u64,
    pub view: u32,
    pub votes: Vec<Vote>,
}

impl Proof {
    /// A proof with the given votes.
    pub fn new(height: u64, view: u32, votes: Vec<Vote>) -> Self {
        Self {
            height,
            view,
            votes,
        }
    }

    /// A proof carrying no votes, announcing `(height, view)` only.
    pub fn empty(height: u64, view: u32) -> Self {
        Self::new(height, view, Vec::new())
    }

    fn digest(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_u64(self.height).write_u32(self.view);
        encoder.write_u32(self.votes.len() as u32);
        for vote in &self.votes {
            encoder.write_fixed(&vote.signature.bytes);
        }
        encoder.finish()
    }
}

/// A candidate block proposed by the primary of `(height, view)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Height/view of the proposal plus the votes that justify it (the
    /// VALIDATE quorum of the locked block when re-proposing).
    pub proof: Proof,
    pub block: Block,
    pub signature: Signature,
}

impl Proposal {
    fn signing_bytes(proof: &Proof, block_hash: &Hash) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_fixed(&proof.digest()).write_fixed(block_hash);
        encoder.finish()
    }

    /// Create and sign a proposal.
    pub fn new(proof: Proof, block: Block, keypair: &Ed25519KeyPair) -> Self {
        let bytes = Self::signing_bytes(&proof, &block.hash());
        Self {
            proof,
            block,
            signature: Signature::sign(keypair, &bytes),
        }
    }

    /// Proposal height.
    pub fn height(&self) -> u64 {
        self.proof.height
    }

    /// Proposal view.
    pub fn view(&self) -> u32 {
        self.proof.view
    }

    /// Address of the proposer.
    pub fn proposer(&self) -> Address {
        self.signature.signer()
    }

    /// Signature check plus block height/view consistency. A block built
    /// at an earlier view may be re-proposed.
    pub fn verify(&self) -> bool {
        self.block.header.height == self.proof.height
            && self.block.header.view <= self.proof.view
            && self
                .signature
                .verify(&Self::signing_bytes(&self.proof, &self.block.hash()))
    }
}
