//! # Vote Tallying
//!
//! One [`VoteSet`] per vote type per `(height, view)`. Only votes from the
//! current validator set count. A validator that signs two different
//! values in the same set is an equivocator: its votes are kept as
//! evidence but no longer count toward any value.

use shared_types::{Address, Hash, Vote, VoteType};
use std::collections::{BTreeMap, BTreeSet};

/// Votes needed for a quorum among `n` validators.
pub const fn quorum(n: usize) -> usize {
    n * 2 / 3 + 1
}

/// Result of adding a vote to a [`VoteSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Same voter, same value.
    Duplicate,
    /// Same voter, different value. The voter is now excluded.
    Equivocation,
    NotValidator,
    /// Wrong type, height or view for this set, or a bad signature.
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct VoteSet {
    vote_type: VoteType,
    height: u64,
    view: u32,
    validators: BTreeSet<Address>,
    votes: BTreeMap<Address, Vote>,
    equivocators: BTreeSet<Address>,
}

impl VoteSet {
    pub fn new(vote_type: VoteType, height: u64, view: u32, validators: &[Address]) -> Self {
        Self {
            vote_type,
            height,
            view,
            validators: validators.iter().copied().collect(),
            votes: BTreeMap::new(),
            equivocators: BTreeSet::new(),
        }
    }

    pub fn quorum(&self) -> usize {
        quorum(self.validators.len())
    }

    /// Add a vote, verifying its signature.
    pub fn add(&mut self, vote: Vote) -> AddOutcome {
        if vote.vote_type != self.vote_type
            || vote.height != self.height
            || vote.view != self.view
            || !vote.verify()
        {
            return AddOutcome::Mismatch;
        }
        let voter = vote.voter();
        if !self.validators.contains(&voter) {
            return AddOutcome::NotValidator;
        }
        if self.equivocators.contains(&voter) {
            return AddOutcome::Equivocation;
        }
        match self.votes.get(&voter) {
            Some(existing) if existing.block_hash == vote.block_hash => AddOutcome::Duplicate,
            Some(_) => {
                self.equivocators.insert(voter);
                AddOutcome::Equivocation
            }
            None => {
                self.votes.insert(voter, vote);
                AddOutcome::Added
            }
        }
    }

    fn counted(&self) -> impl Iterator<Item = &Vote> {
        self.votes
            .iter()
            .filter(|(voter, _)| !self.equivocators.contains(*voter))
            .map(|(_, vote)| vote)
    }

    /// Counted votes for `value` (`None` is nil).
    pub fn count(&self, value: Option<Hash>) -> usize {
        self.counted().filter(|v| v.block_hash == value).count()
    }

    /// Counted votes of any value.
    pub fn total(&self) -> usize {
        self.counted().count()
    }

    /// The block hash holding a quorum, if any.
    pub fn approved_hash(&self) -> Option<Hash> {
        let mut tally: BTreeMap<Hash, usize> = BTreeMap::new();
        for hash in self.counted().filter_map(|v| v.block_hash) {
            *tally.entry(hash).or_default() += 1;
        }
        let needed = self.quorum();
        tally
            .into_iter()
            .find(|(_, count)| *count >= needed)
            .map(|(hash, _)| hash)
    }

    /// Whether nil votes hold a quorum.
    pub fn has_nil_quorum(&self) -> bool {
        self.count(None) >= self.quorum()
    }

    /// Whether no value can reach a quorum any more.
    pub fn is_split(&self) -> bool {
        let remaining = self
            .validators
            .len()
            .saturating_sub(self.total() + self.equivocators.len());
        let best = self.counted().fold(BTreeMap::new(), |mut tally, v| {
            *tally.entry(v.block_hash).or_insert(0usize) += 1;
            tally
        });
        let best = best.values().copied().max().unwrap_or(0);
        best + remaining < self.quorum()
    }

    /// Counted votes for `value`, as evidence for a proof.
    pub fn votes_for(&self, value: Option<Hash>) -> Vec<Vote> {
        self.counted()
            .filter(|v| v.block_hash == value)
            .cloned()
            .collect()
    }

    pub fn equivocators(&self) -> &BTreeSet<Address> {
        &self.equivocators
    }
}

/// The three vote sets of one view.
#[derive(Debug, Clone)]
pub struct RoundVotes {
    pub validate: VoteSet,
    pub pre_commit: VoteSet,
    pub commit: VoteSet,
}

impl RoundVotes {
    pub fn new(height: u64, view: u32, validators: &[Address]) -> Self {
        Self {
            validate: VoteSet::new(VoteType::Validate, height, view, validators),
            pre_commit: VoteSet::new(VoteType::PreCommit, height, view, validators),
            commit: VoteSet::new(VoteType::Commit, height, view, validators),
        }
    }

    pub fn add(&mut self, vote: Vote) -> AddOutcome {
        match vote.vote_type {
            VoteType::Validate => self.validate.add(vote),
            VoteType::PreCommit => self.pre_commit.add(vote),
            VoteType::Commit => self.commit.add(vote),
        }
    }
}

/// Whether `votes` hold a quorum of valid, distinct validator signatures
/// of `vote_type` for `hash` at `(height, view)`.
pub fn is_quorum_certificate(
    votes: &[Vote],
    vote_type: VoteType,
    height: u64,
    view: u32,
    hash: Hash,
    validators: &[Address],
) -> bool {
    let mut set = VoteSet::new(vote_type, height, view, validators);
    for vote in votes {
        set.add(vote.clone());
    }
    set.count(Some(hash)) >= set.quorum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::Ed25519KeyPair;

    fn keys(n: u8) -> Vec<Ed25519KeyPair> {
        (1..=n).map(|i| Ed25519KeyPair::from_seed([i; 32])).collect()
    }

    fn addresses(keys: &[Ed25519KeyPair]) -> Vec<Address> {
        keys.iter().map(Ed25519KeyPair::address).collect()
    }

    const BLOCK: Hash = [7u8; 32];

    #[test]
    fn test_quorum_sizes() {
        assert_eq!(quorum(1), 1);
        assert_eq!(quorum(3), 3);
        assert_eq!(quorum(4), 3);
        assert_eq!(quorum(6), 5);
        assert_eq!(quorum(7), 5);
    }

    #[test]
    fn test_quorum_reached() {
        let keys = keys(4);
        let mut set = VoteSet::new(VoteType::Validate, 5, 0, &addresses(&keys));
        for key in &keys[..2] {
            assert_eq!(set.add(Vote::new(VoteType::Validate, 5, 0, Some(BLOCK), key)), AddOutcome::Added);
        }
        assert_eq!(set.approved_hash(), None);
        set.add(Vote::new(VoteType::Validate, 5, 0, Some(BLOCK), &keys[2]));
        assert_eq!(set.approved_hash(), Some(BLOCK));
        assert_eq!(set.votes_for(Some(BLOCK)).len(), 3);
    }

    #[test]
    fn test_rejects_outsiders_and_mismatches() {
        let keys = keys(4);
        let mut set = VoteSet::new(VoteType::Commit, 5, 1, &addresses(&keys[..3]));

        let outsider = Vote::new(VoteType::Commit, 5, 1, Some(BLOCK), &keys[3]);
        assert_eq!(set.add(outsider), AddOutcome::NotValidator);
        let wrong_view = Vote::new(VoteType::Commit, 5, 0, Some(BLOCK), &keys[0]);
        assert_eq!(set.add(wrong_view), AddOutcome::Mismatch);
        let wrong_type = Vote::new(VoteType::PreCommit, 5, 1, Some(BLOCK), &keys[0]);
        assert_eq!(set.add(wrong_type), AddOutcome::Mismatch);

        let mut forged = Vote::new(VoteType::Commit, 5, 1, Some(BLOCK), &keys[0]);
        forged.block_hash = Some([8u8; 32]);
        assert_eq!(set.add(forged), AddOutcome::Mismatch);
        assert_eq!(set.total(), 0);
    }

    #[test]
    fn test_equivocator_is_excluded() {
        let keys = keys(4);
        let mut set = VoteSet::new(VoteType::PreCommit, 5, 0, &addresses(&keys));
        for key in &keys[..3] {
            set.add(Vote::new(VoteType::PreCommit, 5, 0, Some(BLOCK), key));
        }
        assert_eq!(set.approved_hash(), Some(BLOCK));

        let second = Vote::new(VoteType::PreCommit, 5, 0, None, &keys[0]);
        assert_eq!(set.add(second), AddOutcome::Equivocation);
        assert_eq!(set.approved_hash(), None);
        assert!(set.equivocators().contains(&keys[0].address()));

        let again = Vote::new(VoteType::PreCommit, 5, 0, Some(BLOCK), &keys[0]);
        assert_eq!(set.add(again), AddOutcome::Equivocation);
        assert_eq!(set.count(Some(BLOCK)), 2);
    }

    #[test]
    fn test_duplicate_counts_once() {
        let keys = keys(4);
        let mut set = VoteSet::new(VoteType::Validate, 1, 0, &addresses(&keys));
        let vote = Vote::new(VoteType::Validate, 1, 0, None, &keys[0]);
        assert_eq!(set.add(vote.clone()), AddOutcome::Added);
        assert_eq!(set.add(vote), AddOutcome::Duplicate);
        assert_eq!(set.count(None), 1);
    }

    #[test]
    fn test_split_detection() {
        let keys = keys(4);
        let mut set = VoteSet::new(VoteType::Validate, 1, 0, &addresses(&keys));
        set.add(Vote::new(VoteType::Validate, 1, 0, Some(BLOCK), &keys[0]));
        set.add(Vote::new(VoteType::Validate, 1, 0, None, &keys[1]));
        assert!(!set.is_split());
        set.add(Vote::new(VoteType::Validate, 1, 0, Some([9u8; 32]), &keys[2]));
        assert!(set.is_split());
    }

    #[test]
    fn test_quorum_certificate() {
        let keys = keys(4);
        let validators = addresses(&keys);
        let votes: Vec<Vote> = keys[..3]
            .iter()
            .map(|k| Vote::new(VoteType::Validate, 9, 2, Some(BLOCK), k))
            .collect();
        assert!(is_quorum_certificate(&votes, VoteType::Validate, 9, 2, BLOCK, &validators));
        assert!(!is_quorum_certificate(&votes[..2], VoteType::Validate, 9, 2, BLOCK, &validators));
        assert!(!is_quorum_certificate(&votes, VoteType::Commit, 9, 2, BLOCK, &validators));

        let mut doubled = votes[..2].to_vec();
        doubled.push(votes[0].clone());
        assert!(!is_quorum_certificate(&doubled, VoteType::Validate, 9, 2, BLOCK, &validators));
    }
}
