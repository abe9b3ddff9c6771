//! Stateless admission rules applied before a transaction is executed.

use crate::domain::{PoolError, PoolResult};
use shared_types::{ChainSpec, Fork, Transaction, TransactionType};

/// Reject timestamps more than `max_drift` ms away from `now` in either
/// direction.
pub fn check_time_drift(tx: &Transaction, now: u64, max_drift: u64) -> PoolResult<()> {
    if tx.timestamp.abs_diff(now) > max_drift {
        return Err(PoolError::TimestampDrift {
            timestamp: tx.timestamp,
            now,
        });
    }
    Ok(())
}

/// CREATE and CALL are only admitted once the VM fork is active at the
/// height they would be included in.
pub fn check_vm_enabled(tx: &Transaction, spec: &ChainSpec, height: u64) -> PoolResult<()> {
    if tx.is_vm_transaction() && !spec.is_fork_active(Fork::VirtualMachine, height) {
        return Err(PoolError::VmDisabled);
    }
    Ok(())
}

/// Bound the amount of a VOTE/UNVOTE and how many of them one sender may
/// have pending. `pending` counts the sender's pooled transactions of the
/// same type.
pub fn check_vote_limits(tx: &Transaction, spec: &ChainSpec, pending: u32) -> PoolResult<()> {
    let (max_amount, max_count) = match tx.tx_type {
        TransactionType::Vote => (spec.max_vote_amount, spec.max_vote_count),
        TransactionType::Unvote => (spec.max_unvote_amount, spec.max_unvote_count),
        _ => return Ok(()),
    };
    if tx.value > max_amount {
        return Err(PoolError::AmountLimit {
            tx_type: tx.tx_type,
        });
    }
    if pending >= max_count {
        return Err(PoolError::CountLimit {
            tx_type: tx.tx_type,
            count: pending,
        });
    }
    Ok(())
}
