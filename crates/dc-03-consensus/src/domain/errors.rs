use dc_01_ledger_state::LedgerError;
use dc_02_transaction_execution::ExecutionError;
use thiserror::Error;

/// Consensus failures.
///
/// Bad peer input is never an error here; it is logged and dropped.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("validator set is empty")]
    NoValidators,

    #[error("sync failed: {0}")]
    Sync(String),

    #[error("engine is not running")]
    NotRunning,

    #[error("consensus task stopped")]
    Stopped,
}

impl ConsensusError {
    /// Whether the node must halt.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_fatal(),
            Self::Execution(e) => e.is_fatal(),
            Self::NoValidators => true,
            Self::Sync(_) | Self::NotRunning | Self::Stopped => false,
        }
    }
}

/// Result alias for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
