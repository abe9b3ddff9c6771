use dc_01_ledger_state::LedgerError;
use dc_02_transaction_execution::ExecutionError;
use shared_types::{Hash, ResultCode, TransactionType, ValidationError};
use thiserror::Error;

/// Why a transaction was not admitted.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("invalid transaction: {0}")]
    Invalid(#[from] ValidationError),

    #[error("timestamp {timestamp} is too far from local time {now}")]
    TimestampDrift { timestamp: u64, now: u64 },

    #[error("transaction {0:?} is already pending")]
    Duplicate(Hash),

    #[error("transaction {0:?} is already on chain")]
    AlreadyOnChain(Hash),

    #[error("virtual machine transactions are not enabled yet")]
    VmDisabled,

    #[error("{} amount exceeds the limit", .tx_type.name())]
    AmountLimit { tx_type: TransactionType },

    #[error("sender already has {count} pending {} transactions", .tx_type.name())]
    CountLimit { tx_type: TransactionType, count: u32 },

    #[error("pool is full ({capacity} transactions)")]
    PoolFull { capacity: usize },

    #[error("execution rejected the transaction with {0:?}")]
    Rejected(ResultCode),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl PoolError {
    /// Result code reported back to the submitter.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Invalid(ValidationError::ForbiddenType(_)) | Self::VmDisabled => {
                ResultCode::InvalidType
            }
            Self::Invalid(_) => ResultCode::InvalidFormat,
            Self::TimestampDrift { .. } => ResultCode::InvalidTimestamp,
            Self::Duplicate(_) | Self::AlreadyOnChain(_) => ResultCode::Duplicated,
            Self::AmountLimit { tx_type } | Self::CountLimit { tx_type, .. } => {
                if *tx_type == TransactionType::Unvote {
                    ResultCode::InvalidUnvoting
                } else {
                    ResultCode::InvalidVoting
                }
            }
            Self::Rejected(code) => *code,
            Self::PoolFull { .. } | Self::Ledger(_) | Self::Execution(_) => ResultCode::Invalid,
        }
    }

    /// Whether the node must halt.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_fatal(),
            Self::Execution(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Result alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
