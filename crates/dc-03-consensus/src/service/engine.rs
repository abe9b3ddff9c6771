//! # BFT Engine
//!
//! The per-height phase machine:
//!
//! ```text
//! NEW_HEIGHT ─timeout─→ PROPOSE ─proposal─→ VALIDATE ─2f+1─→ PRE_COMMIT ─2f+1─→ COMMIT ─2f+1─→ FINALIZE
//!                          ↑                    │                 │                 │
//!                          └──── view + 1 ◄─────┴──── timeout ────┴─────────────────┘
//! ```
//!
//! ## Locking
//!
//! A VALIDATE quorum for a block locks the node on it. A locked node votes
//! only for its locked block and re-proposes it when it is the primary,
//! carrying the quorum as justification. Before its COMMIT vote, a node
//! moves its lock to a block with a VALIDATE quorum at a higher view. After
//! its COMMIT vote, the lock never moves at this height.
//!
//! A COMMIT quorum decides the height even for a block that conflicts
//! with the local lock. Such a block is executed from its stored proposal
//! before it is imported.
//!
//! ## View synchronization
//!
//! The highest view each validator has shown through `NEW_VIEW`, a signed
//! vote or a proposal is tallied. Once `f + 1` validators are above our
//! view, at least one honest node is there, and we jump to the highest
//! view backed by `f + 1` of them.
//!
//! Messages for the next height arrive while this node still finalizes
//! the current one. They are held and replayed on entering that height.

use crate::config::BftConfig;
use crate::domain::{
    is_quorum_certificate, quorum, AddOutcome, ConsensusError, ConsensusResult, Phase,
    PrimarySelector, RoundVotes, Step,
};
use crate::metrics;
use crate::ports::{Clock, ConsensusApi, ConsensusChain, PendingTransactions};
use dc_02_transaction_execution::ExecutedBlock;
use shared_bus::Channel;
use shared_crypto::{address_of, Ed25519KeyPair};
use shared_types::{
    address_hex, short_hash, Address, ChainSpec, ConsensusMessage, Hash, Message, PeerId, Proof,
    Proposal, Vote, VoteType,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Block this node is locked on.
#[derive(Debug, Clone)]
struct Lock {
    hash: Hash,
    view: u32,
    /// VALIDATE quorum for `hash` at `view`.
    votes: Vec<Vote>,
}

/// COMMIT votes that finalized the previous height, with the validator
/// set they were counted against.
#[derive(Debug, Clone)]
struct LastCommit {
    proof: Proof,
    validators: Vec<Address>,
}

/// Dependencies of [`BftEngine`].
pub struct BftDependencies {
    pub spec: Arc<ChainSpec>,
    pub chain: Arc<dyn ConsensusChain>,
    pub pool: Arc<dyn PendingTransactions>,
    pub channel: Arc<dyn Channel>,
    pub clock: Arc<dyn Clock>,
}

pub struct BftEngine {
    config: BftConfig,
    keypair: Ed25519KeyPair,
    address: Address,
    spec: Arc<ChainSpec>,
    chain: Arc<dyn ConsensusChain>,
    pool: Arc<dyn PendingTransactions>,
    channel: Arc<dyn Channel>,
    clock: Arc<dyn Clock>,
    selector: PrimarySelector,

    running: bool,
    height: u64,
    view: u32,
    phase: Phase,
    deadline: Option<u64>,
    validators: Vec<Address>,

    rounds: BTreeMap<u32, RoundVotes>,
    proposals: BTreeMap<u32, Proposal>,
    /// Executed candidate blocks of this height.
    blocks: HashMap<Hash, ExecutedBlock>,
    /// Blocks that failed validation at this height.
    rejected: HashSet<Hash>,
    /// `(vote type, view)` pairs this node already signed.
    voted: HashSet<(VoteType, u32)>,
    lock: Option<Lock>,
    committed: bool,
    /// Highest view each validator has shown at this height.
    peer_views: HashMap<Address, u32>,
    /// Messages for `height + 1`, in arrival order.
    future: Vec<(PeerId, ConsensusMessage)>,
    last_commit: Option<LastCommit>,
}

impl BftEngine {
    pub fn new(config: BftConfig, keypair: Ed25519KeyPair, deps: BftDependencies) -> Self {
        let address = keypair.address();
        Self {
            config,
            keypair,
            address,
            selector: PrimarySelector::new(Arc::clone(&deps.spec)),
            spec: deps.spec,
            chain: deps.chain,
            pool: deps.pool,
            channel: deps.channel,
            clock: deps.clock,
            running: false,
            height: 0,
            view: 0,
            phase: Phase::NewHeight,
            deadline: None,
            validators: Vec::new(),
            rounds: BTreeMap::new(),
            proposals: BTreeMap::new(),
            blocks: HashMap::new(),
            rejected: HashSet::new(),
            voted: HashSet::new(),
            lock: None,
            committed: false,
            peer_views: HashMap::new(),
            future: Vec::new(),
            last_commit: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn validators(&self) -> &[Address] {
        &self.validators
    }

    /// Hash of the block this node is locked on.
    pub fn locked_hash(&self) -> Option<Hash> {
        self.lock.as_ref().map(|lock| lock.hash)
    }

    /// COMMIT quorum of the last height this node finalized.
    pub fn last_commit(&self) -> Option<&Proof> {
        self.last_commit.as_ref().map(|commit| &commit.proof)
    }

    /// Primary of the current view.
    pub fn primary(&self) -> Option<Address> {
        self.selector.select(&self.validators, self.height, self.view)
    }

    /// Re-enter consensus on the chain head after a sync.
    pub fn resync(&mut self) -> ConsensusResult<()> {
        if !self.running {
            return Err(ConsensusError::NotRunning);
        }
        self.enter_new_height()
    }

    fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    fn arm(&mut self, phase: Phase) {
        self.phase = phase;
        self.deadline = Some(
            self.now()
                .saturating_add(self.config.timeout(phase, self.view).as_millis() as u64),
        );
    }

    fn broadcast(&self, message: ConsensusMessage) {
        self.channel.broadcast(Message::Consensus(message));
    }

    fn is_validator(&self) -> bool {
        self.validators.contains(&self.address)
    }

    // -------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------

    fn enter_new_height(&mut self) -> ConsensusResult<()> {
        let head = self.chain.latest_header()?;
        let validators = self.chain.validators();
        if validators.is_empty() {
            return Err(ConsensusError::NoValidators);
        }

        self.height = head.height + 1;
        self.view = 0;
        self.validators = validators;
        self.rounds.clear();
        self.proposals.clear();
        self.blocks.clear();
        self.rejected.clear();
        self.voted.clear();
        self.lock = None;
        self.committed = false;
        self.peer_views.clear();
        if self
            .last_commit
            .as_ref()
            .is_some_and(|commit| commit.proof.height != head.height)
        {
            self.last_commit = None;
        }

        metrics::set_round(self.height, self.view);
        self.arm(Phase::NewHeight);
        debug!(height = self.height, validators = self.validators.len(), "Entering NEW_HEIGHT");
        self.broadcast(ConsensusMessage::NewHeight(self.height));
        self.replay_future()
    }

    fn replay_future(&mut self) -> ConsensusResult<()> {
        let buffered = std::mem::take(&mut self.future);
        if buffered.is_empty() {
            return Ok(());
        }
        debug!(height = self.height, messages = buffered.len(), "Replaying held messages");
        for (from, message) in buffered {
            if message_height(&message) == self.height {
                self.dispatch(from, message)?;
            }
        }
        Ok(())
    }

    fn enter_propose(&mut self) -> ConsensusResult<()> {
        self.arm(Phase::Propose);
        let primary = self.primary();
        debug!(
            height = self.height,
            view = self.view,
            primary = ?primary.map(|p| address_hex(&p)),
            "Entering PROPOSE"
        );

        if primary == Some(self.address) {
            let proposal = self.make_proposal()?;
            info!(
                height = self.height,
                view = self.view,
                hash = %short_hash(&proposal.block.hash()),
                txs = proposal.block.transactions.len(),
                "Proposing block"
            );
            self.broadcast(ConsensusMessage::Proposal(Box::new(proposal.clone())));
            self.proposals.insert(self.view, proposal);
        }

        if let Some(proposal) = self.proposals.get(&self.view).cloned() {
            self.enter_validate(&proposal)?;
        }
        Ok(())
    }

    fn make_proposal(&mut self) -> ConsensusResult<Proposal> {
        if let Some(lock) = &self.lock {
            if let Some(executed) = self.blocks.get(&lock.hash) {
                let proof = Proof::new(self.height, self.view, lock.votes.clone());
                return Ok(Proposal::new(proof, executed.block.clone(), &self.keypair));
            }
        }

        let pending = self.pool.pending_transactions(self.spec.max_block_gas_limit);
        let executed = self
            .chain
            .build_block(self.address, self.view, self.now(), pending)?;
        let block = executed.block.clone();
        self.blocks.insert(executed.hash(), executed);
        Ok(Proposal::new(
            Proof::empty(self.height, self.view),
            block,
            &self.keypair,
        ))
    }

    fn enter_validate(&mut self, proposal: &Proposal) -> ConsensusResult<()> {
        self.arm(Phase::Validate);
        let hash = proposal.block.hash();

        let conflicting_lock = self.locked_hash().filter(|locked| *locked != hash);
        let value = match conflicting_lock {
            Some(locked) => {
                debug!(
                    height = self.height,
                    view = self.view,
                    locked = %short_hash(&locked),
                    "Proposal conflicts with lock"
                );
                None
            }
            None => self.execute(proposal).then_some(hash),
        };

        debug!(
            height = self.height,
            view = self.view,
            hash = %short_hash(&hash),
            approve = value.is_some(),
            "Entering VALIDATE"
        );
        self.cast_vote(VoteType::Validate, value);
        self.check_progress()
    }

    /// Execute the block a COMMIT quorum decided on, ignoring the lock.
    /// Returns false when its proposal never reached this node.
    fn ensure_executed(&mut self, hash: Hash) -> bool {
        if self.blocks.contains_key(&hash) {
            return true;
        }
        let proposal = self
            .proposals
            .values()
            .find(|proposal| proposal.block.hash() == hash)
            .cloned();
        match proposal {
            Some(proposal) => self.execute(&proposal),
            None => false,
        }
    }

    /// Execute a proposed block unless already known. Returns validity.
    fn execute(&mut self, proposal: &Proposal) -> bool {
        let hash = proposal.block.hash();
        if self.blocks.contains_key(&hash) {
            return true;
        }
        if self.rejected.contains(&hash) {
            return false;
        }
        match self.chain.validate_block(&proposal.block, self.now()) {
            Ok(executed) => {
                self.blocks.insert(hash, executed);
                true
            }
            Err(e) => {
                warn!(height = self.height, hash = %short_hash(&hash), error = %e, "Invalid proposal");
                self.rejected.insert(hash);
                false
            }
        }
    }

    fn next_view(&mut self, cause: &str) -> ConsensusResult<()> {
        self.move_to_view(self.view + 1, cause)
    }

    fn move_to_view(&mut self, view: u32, cause: &str) -> ConsensusResult<()> {
        info!(
            height = self.height,
            from = self.view,
            to = view,
            phase = %self.phase,
            cause,
            "View change"
        );
        metrics::record_view_change(cause);
        self.view = view;
        metrics::set_round(self.height, self.view);

        let votes = self
            .lock
            .as_ref()
            .map(|lock| lock.votes.clone())
            .unwrap_or_default();
        self.broadcast(ConsensusMessage::NewView(Proof::new(self.height, view, votes)));
        self.enter_propose()
    }

    fn finalize(&mut self, hash: Hash, commit_view: u32) -> ConsensusResult<()> {
        let votes = self
            .rounds
            .get(&commit_view)
            .map(|round| round.commit.votes_for(Some(hash)))
            .unwrap_or_default();
        let Some(executed) = self.blocks.remove(&hash) else {
            return Ok(());
        };

        let proof = Proof::new(self.height, commit_view, votes.clone());
        match self.chain.import_block(executed, votes) {
            Ok(()) => {
                self.last_commit = Some(LastCommit {
                    proof,
                    validators: self.validators.clone(),
                });
                metrics::record_block_finalized();
                info!(
                    height = self.height,
                    view = commit_view,
                    hash = %short_hash(&hash),
                    "Block finalized"
                );
                self.arm(Phase::Finalize);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                // Imported by sync in the meantime.
                warn!(height = self.height, error = %e, "Finalized block not imported");
                self.enter_new_height()
            }
        }
    }

    // -------------------------------------------------------------------
    // Votes
    // -------------------------------------------------------------------

    fn cast_vote(&mut self, vote_type: VoteType, value: Option<Hash>) {
        if !self.is_validator() || !self.voted.insert((vote_type, self.view)) {
            return;
        }
        let vote = Vote::new(vote_type, self.height, self.view, value, &self.keypair);
        self.broadcast(ConsensusMessage::Vote(vote.clone()));
        self.record_vote(vote);
    }

    fn record_vote(&mut self, vote: Vote) -> AddOutcome {
        let (height, view) = (vote.height, vote.view);
        let voter = vote.voter();
        let vote_type = vote.vote_type;
        let outcome = self
            .rounds
            .entry(view)
            .or_insert_with(|| RoundVotes::new(height, view, &self.validators))
            .add(vote);
        match outcome {
            AddOutcome::Equivocation => {
                metrics::record_equivocation();
                warn!(
                    height,
                    view,
                    vote_type = %vote_type,
                    voter = %address_hex(&voter),
                    "Equivocating validator excluded"
                );
            }
            AddOutcome::NotValidator | AddOutcome::Mismatch => {
                debug!(height, view, outcome = ?outcome, "Vote dropped");
            }
            AddOutcome::Added | AddOutcome::Duplicate => {}
        }
        outcome
    }

    /// Add a late COMMIT vote for the previously finalized block.
    fn extend_last_commit(&mut self, vote: Vote) {
        let Some(commit) = self.last_commit.as_mut() else {
            return;
        };
        let voter = vote.voter();
        let expected = commit.proof.votes.first().map(|first| first.block_hash);
        if vote.view != commit.proof.view
            || expected != Some(vote.block_hash)
            || !commit.validators.contains(&voter)
            || commit.proof.votes.iter().any(|known| known.voter() == voter)
            || !vote.verify()
        {
            return;
        }
        debug!(height = vote.height, voter = %address_hex(&voter), "Late commit vote kept");
        commit.proof.votes.push(vote);
    }

    /// Move the lock to a VALIDATE quorum at a higher view.
    fn update_lock(&mut self) {
        if self.committed {
            return;
        }
        let floor = self.lock.as_ref().map(|lock| lock.view);
        let candidate = self
            .rounds
            .iter()
            .rev()
            .filter(|(view, _)| **view <= self.view && floor.map_or(true, |f| **view > f))
            .find_map(|(view, round)| {
                round
                    .validate
                    .approved_hash()
                    .filter(|hash| self.blocks.contains_key(hash))
                    .map(|hash| (*view, hash, round.validate.votes_for(Some(hash))))
            });
        if let Some((view, hash, votes)) = candidate {
            debug!(height = self.height, view, hash = %short_hash(&hash), "Locked");
            self.lock = Some(Lock { hash, view, votes });
        }
    }

    fn check_progress(&mut self) -> ConsensusResult<()> {
        if self.phase == Phase::Finalize {
            return Ok(());
        }

        let decided = self
            .rounds
            .iter()
            .find_map(|(view, round)| round.commit.approved_hash().map(|hash| (hash, *view)));
        if let Some((hash, view)) = decided {
            if self.ensure_executed(hash) {
                return self.finalize(hash, view);
            }
            debug!(
                height = self.height,
                view,
                hash = %short_hash(&hash),
                "Commit quorum for a block not seen yet"
            );
        }

        self.update_lock();

        loop {
            let phase = self.phase;
            let Some(round) = self.rounds.get(&self.view) else {
                return Ok(());
            };
            match phase {
                Phase::Validate => {
                    let polka = round.validate.approved_hash();
                    let stuck = round.validate.has_nil_quorum() || round.validate.is_split();
                    match polka {
                        Some(hash) if self.locked_hash() == Some(hash) => {
                            self.arm(Phase::PreCommit);
                            debug!(height = self.height, view = self.view, "Entering PRE_COMMIT");
                            self.cast_vote(VoteType::PreCommit, Some(hash));
                        }
                        _ if stuck => return self.next_view("no_validate_quorum"),
                        _ => return Ok(()),
                    }
                }
                Phase::PreCommit => {
                    let approved = round.pre_commit.approved_hash();
                    let stuck = round.pre_commit.has_nil_quorum() || round.pre_commit.is_split();
                    match approved {
                        Some(hash) if self.blocks.contains_key(&hash) => {
                            self.committed = true;
                            self.arm(Phase::Commit);
                            debug!(height = self.height, view = self.view, "Entering COMMIT");
                            self.cast_vote(VoteType::Commit, Some(hash));
                            return self.check_progress();
                        }
                        _ if stuck => return self.next_view("no_pre_commit_quorum"),
                        _ => return Ok(()),
                    }
                }
                Phase::Commit if round.commit.is_split() => {
                    return self.next_view("no_commit_quorum");
                }
                _ => return Ok(()),
            }
        }
    }

    // -------------------------------------------------------------------
    // Inbound messages
    // -------------------------------------------------------------------

    fn within_window(&self, view: u32) -> bool {
        view <= self.view.saturating_add(self.config.max_view_ahead)
    }

    fn on_proposal(&mut self, proposal: Proposal) -> ConsensusResult<()> {
        let (height, view) = (proposal.height(), proposal.view());
        if height != self.height || !self.within_window(view) {
            debug!(height, view, "Stale proposal dropped");
            return Ok(());
        }
        if !proposal.verify() {
            warn!(height, view, "Proposal with bad signature dropped");
            return Ok(());
        }
        if self.selector.select(&self.validators, height, view) != Some(proposal.proposer()) {
            warn!(height, view, "Proposal from non-primary dropped");
            return Ok(());
        }
        if let Some(existing) = self.proposals.get(&view) {
            if existing.block.hash() != proposal.block.hash() {
                warn!(height, view, "Conflicting proposal from primary dropped");
            }
            return Ok(());
        }

        let block_view = proposal.block.header.view;
        if block_view < view && !self.is_justified(&proposal) {
            warn!(height, view, block_view, "Unjustified re-proposal dropped");
            return Ok(());
        }

        let proposer = proposal.proposer();
        self.proposals.insert(view, proposal.clone());
        if view == self.view && self.phase == Phase::Propose {
            return self.enter_validate(&proposal);
        }
        // Kept for a later view, or for a COMMIT quorum at an earlier one.
        if self.observe_view(proposer, view)? {
            return Ok(());
        }
        self.check_progress()
    }

    /// A re-proposed block must carry a VALIDATE quorum from a view in
    /// `[block view, proposal view)`.
    fn is_justified(&self, proposal: &Proposal) -> bool {
        let Some(first) = proposal.proof.votes.first() else {
            return false;
        };
        let polka_view = first.view;
        polka_view >= proposal.block.header.view
            && polka_view < proposal.view()
            && is_quorum_certificate(
                &proposal.proof.votes,
                VoteType::Validate,
                self.height,
                polka_view,
                proposal.block.hash(),
                &self.validators,
            )
    }

    fn on_vote(&mut self, vote: Vote) -> ConsensusResult<()> {
        let late_commit = vote.vote_type == VoteType::Commit
            && self
                .last_commit
                .as_ref()
                .is_some_and(|commit| commit.proof.height == vote.height);
        if late_commit {
            self.extend_last_commit(vote);
            return Ok(());
        }
        if vote.height != self.height || !self.within_window(vote.view) {
            return Ok(());
        }
        let (voter, view) = (vote.voter(), vote.view);
        let outcome = self.record_vote(vote);
        if matches!(outcome, AddOutcome::Added) && self.observe_view(voter, view)? {
            return Ok(());
        }
        self.check_progress()
    }

    fn on_new_view(&mut self, from: PeerId, proof: Proof) -> ConsensusResult<()> {
        if proof.height != self.height {
            return Ok(());
        }
        let sender = address_of(&from.0);
        if !self.validators.contains(&sender) {
            return Ok(());
        }

        for vote in proof.votes {
            if vote.height == self.height && self.within_window(vote.view) {
                self.record_vote(vote);
            }
        }
        if self.observe_view(sender, proof.view)? {
            return Ok(());
        }
        self.check_progress()
    }

    /// Note that `validator` is at `view` or above, and follow once `f + 1`
    /// validators are ahead of us. Returns whether the view changed.
    fn observe_view(&mut self, validator: Address, view: u32) -> ConsensusResult<bool> {
        if validator == self.address || !self.validators.contains(&validator) {
            return Ok(false);
        }
        let seen = self.peer_views.entry(validator).or_insert(view);
        *seen = (*seen).max(view);

        let needed = self.validators.len() - quorum(self.validators.len()) + 1;
        let mut views: Vec<u32> = self.peer_views.values().copied().collect();
        views.sort_unstable_by(|a, b| b.cmp(a));
        match views.get(needed - 1).copied() {
            Some(target) if target > self.view && self.phase != Phase::Finalize => {
                self.move_to_view(target, "peer_views")?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Hold a message for the next height, up to the configured bound.
    fn defer(&mut self, from: PeerId, message: ConsensusMessage) {
        if self.future.len() >= self.config.max_future_messages {
            debug!(height = self.height, "Future message buffer full, dropping");
            return;
        }
        self.future.push((from, message));
    }

    fn dispatch(&mut self, from: PeerId, message: ConsensusMessage) -> ConsensusResult<()> {
        match message {
            ConsensusMessage::NewHeight(_) => Ok(()),
            ConsensusMessage::NewView(proof) => self.on_new_view(from, proof),
            ConsensusMessage::Proposal(proposal) => self.on_proposal(*proposal),
            ConsensusMessage::Vote(vote) => self.on_vote(vote),
        }
    }

    /// Height to sync to when a two-thirds share of validators work on a
    /// height above the one after our chain head.
    fn sync_target(&self) -> Option<u64> {
        let next = self
            .chain
            .latest_header()
            .map_or(self.height, |head| head.height + 1);
        let n = self.validators.len();
        let needed = (2 * n + 2) / 3;
        let mut heights: Vec<u64> = self
            .channel
            .peers()
            .into_iter()
            .filter(|peer| {
                let address = address_of(&peer.id.0);
                address != self.address && self.validators.contains(&address)
            })
            .map(|peer| peer.latest_height)
            .collect();
        if needed == 0 || heights.len() < needed {
            return None;
        }
        heights.sort_unstable_by(|a, b| b.cmp(a));
        let target = heights[needed - 1];
        (target > next).then_some(target)
    }
}

fn message_height(message: &ConsensusMessage) -> u64 {
    match message {
        ConsensusMessage::NewHeight(height) => *height,
        ConsensusMessage::NewView(proof) => proof.height,
        ConsensusMessage::Proposal(proposal) => proposal.height(),
        ConsensusMessage::Vote(vote) => vote.height,
    }
}

impl ConsensusApi for BftEngine {
    fn start(&mut self) -> ConsensusResult<()> {
        self.running = true;
        info!(address = %address_hex(&self.address), "Consensus started");
        self.enter_new_height()
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.deadline = None;
            info!(height = self.height, "Consensus stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn on_message(&mut self, from: PeerId, message: ConsensusMessage) -> ConsensusResult<Step> {
        if !self.running {
            return Ok(Step::Continue);
        }
        match message {
            ConsensusMessage::NewHeight(height) => {
                if height > self.height {
                    debug!(from = %from, height, "Peer ahead");
                    if let Some(target) = self.sync_target() {
                        return Ok(Step::Sync(target));
                    }
                }
            }
            message if message_height(&message) == self.height + 1 => self.defer(from, message),
            message => self.dispatch(from, message)?,
        }
        Ok(Step::Continue)
    }

    fn on_timeout(&mut self) -> ConsensusResult<Step> {
        if !self.running {
            return Ok(Step::Continue);
        }
        if let Some(target) = self.sync_target() {
            info!(height = self.height, target, "Behind peers, syncing");
            self.deadline = None;
            return Ok(Step::Sync(target));
        }
        match self.phase {
            Phase::NewHeight => self.enter_propose()?,
            Phase::Propose => self.next_view("propose_timeout")?,
            Phase::Validate => self.next_view("validate_timeout")?,
            Phase::PreCommit => self.next_view("pre_commit_timeout")?,
            Phase::Commit => self.next_view("commit_timeout")?,
            Phase::Finalize => self.enter_new_height()?,
        }
        Ok(Step::Continue)
    }

    fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    fn height(&self) -> u64 {
        self.height
    }

    fn view(&self) -> u32 {
        self.view
    }

    fn phase(&self) -> Phase {
        self.phase
    }
}
