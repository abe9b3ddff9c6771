use dc_01_ledger_state::LedgerError;
use dc_02_transaction_execution::ExecutionError;
use thiserror::Error;

/// Why a downloaded block's finality votes were rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("validator set is empty")]
    NoValidators,

    #[error("vote {index} is not a COMMIT for this block")]
    WrongVote { index: usize },

    #[error("votes span more than one view")]
    MixedViews,

    #[error("vote {index} has an invalid signature")]
    BadSignature { index: usize },

    #[error("vote {index} is not from a validator")]
    NotValidator { index: usize },

    #[error("vote {index} repeats a voter")]
    DuplicateVoter { index: usize },

    #[error("{have} commit votes, {need} required")]
    NoQuorum { have: usize, need: usize },
}

/// Sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("block {height} has an invalid commit proof: {reason}")]
    InvalidCommit { height: u64, reason: CommitError },

    #[error("sync is already running")]
    AlreadyRunning,

    #[error("no block applied for {idle_ms} ms at height {height}")]
    Stalled { height: u64, idle_ms: u64 },

    #[error("sync task stopped")]
    Stopped,
}

impl SyncError {
    /// Whether the node must halt.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_fatal(),
            Self::Execution(e) => e.is_fatal(),
            Self::InvalidCommit { .. } | Self::AlreadyRunning | Self::Stalled { .. } | Self::Stopped => {
                false
            }
        }
    }
}

/// Result alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_peer_data_is_not_fatal() {
        let err = SyncError::InvalidCommit {
            height: 7,
            reason: CommitError::NoQuorum { have: 1, need: 3 },
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("1 commit votes, 3 required"));
        assert!(SyncError::Ledger(LedgerError::Closed).is_fatal());
    }
}
