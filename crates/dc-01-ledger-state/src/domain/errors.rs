use shared_types::{ArithmeticError, CodecError};
use thiserror::Error;

/// Ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Underlying key-value store failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// A stored value could not be decoded.
    #[error("codec failure: {0}")]
    Codec(#[from] CodecError),

    /// Amount arithmetic overflowed or underflowed.
    #[error("arithmetic failure: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("non-sequential block: expected height {expected}, got {actual}")]
    NonSequential { expected: u64, actual: u64 },

    #[error("parent hash mismatch at height {0}")]
    ParentMismatch(u64),

    #[error("chain not initialized")]
    NotInitialized,

    #[error("stored genesis does not match the configured genesis")]
    GenesisMismatch,

    #[error("ledger closed")]
    Closed,
}

impl LedgerError {
    /// Whether the node must halt rather than continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Codec(_) | Self::Closed)
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
