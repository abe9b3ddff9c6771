//! Finality proof carried by a synced block.
//!
//! A finalized block carries the COMMIT votes that justified it. They must
//! all be for this block, come from one view at or after the view the
//! block was built in, and include a quorum of distinct validators of the
//! set in force at that height.

use crate::domain::CommitError;
use shared_types::{Address, Block, VoteType};
use std::collections::HashSet;

/// Votes needed out of `n` validators: more than two thirds.
pub const fn quorum(n: usize) -> usize {
    n * 2 / 3 + 1
}

/// Check the finality votes of `block` against `validators`.
pub fn verify_commit_votes(block: &Block, validators: &[Address]) -> Result<(), CommitError> {
    if validators.is_empty() {
        return Err(CommitError::NoValidators);
    }
    let hash = block.hash();
    let view = block.votes.first().map(|vote| vote.view);
    let mut voters = HashSet::with_capacity(block.votes.len());

    for (index, vote) in block.votes.iter().enumerate() {
        if vote.vote_type != VoteType::Commit
            || vote.height != block.height()
            || vote.block_hash != Some(hash)
            || vote.view < block.header.view
        {
            return Err(CommitError::WrongVote { index });
        }
        if Some(vote.view) != view {
            return Err(CommitError::MixedViews);
        }
        if !vote.verify() {
            return Err(CommitError::BadSignature { index });
        }
        let voter = vote.voter();
        if !validators.contains(&voter) {
            return Err(CommitError::NotValidator { index });
        }
        if !voters.insert(voter) {
            return Err(CommitError::DuplicateVoter { index });
        }
    }

    let need = quorum(validators.len());
    if voters.len() < need {
        return Err(CommitError::NoQuorum {
            have: voters.len(),
            need,
        });
    }
    Ok(())
}
