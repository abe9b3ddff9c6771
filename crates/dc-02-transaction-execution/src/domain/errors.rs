use dc_01_ledger_state::LedgerError;
use shared_types::{CodecError, ResultCode, ValidationError};
use thiserror::Error;

/// Why a block failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("expected height {expected}, got {actual}")]
    WrongHeight { expected: u64, actual: u64 },

    #[error("parent hash does not match the chain head")]
    ParentMismatch,

    #[error("timestamp {timestamp} is not after parent timestamp {parent}")]
    TimestampNotIncreasing { timestamp: u64, parent: u64 },

    #[error("timestamp {timestamp} is too far ahead of local time {now}")]
    TimestampInFuture { timestamp: u64, now: u64 },

    #[error("header data is {0} bytes")]
    HeaderDataTooLarge(usize),

    #[error("transaction {index} is invalid: {error}")]
    InvalidTransaction { index: usize, error: ValidationError },

    #[error("transaction {index} is a duplicate")]
    DuplicateTransaction { index: usize },

    #[error("transaction {index} was rejected with {code:?}")]
    RejectedTransaction { index: usize, code: ResultCode },

    #[error("transactions root mismatch")]
    TransactionsRootMismatch,

    #[error("results root mismatch")]
    ResultsRootMismatch,

    #[error("state root mismatch")]
    StateRootMismatch,
}

/// Execution failures.
///
/// Per-transaction problems never surface here; they become result codes.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Committed state could not be read or written.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("invalid block at height {height}: {reason}")]
    InvalidBlock { height: u64, reason: BlockError },
}

impl ExecutionError {
    pub fn invalid_block(height: u64, reason: BlockError) -> Self {
        Self::InvalidBlock { height, reason }
    }

    /// Whether the failure leaves the node unable to continue.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_fatal(),
            Self::Codec(_) | Self::InvalidBlock { .. } => false,
        }
    }
}

/// Result alias for execution operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;
