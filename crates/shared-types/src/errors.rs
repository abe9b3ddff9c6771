//! # Error Types
//!
//! Defines error types shared across subsystems.

use thiserror::Error;

/// Wire encoding failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Malformed or oversized input.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Header extension data exceeds its size bound.
    #[error("header data too large: {size} > {max} bytes")]
    HeaderDataTooLarge { size: usize, max: usize },
}

/// Structural validation failures for transactions, blocks and votes.
///
/// These are protocol-fatal: the offending item is dropped, it never reaches
/// the executor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Transaction or block targets another network.
    #[error("wrong network: expected {expected}, got {actual}")]
    WrongNetwork { expected: u8, actual: u8 },

    /// Stored hash does not match the recomputed hash.
    #[error("hash mismatch")]
    HashMismatch,

    /// Signature does not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// `from` is not the address of the signing key.
    #[error("sender does not match signing key")]
    SenderMismatch,

    /// Type may not be submitted by users.
    #[error("transaction type {0} is not user-submittable")]
    ForbiddenType(&'static str),

    /// Data payload exceeds the absolute wire bound.
    #[error("data too large: {0} bytes")]
    DataTooLarge(usize),
}

/// Node operational states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Not yet started.
    Idle,
    /// Catching up through the sync manager.
    Syncing,
    /// Participating in consensus.
    Running,
    /// Shutting down.
    Stopping,
}
