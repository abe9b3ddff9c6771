//! # Block Sync Service
//!
//! Implements [`SyncManager`]. A run downloads every height in
//! `[head + 1, target)` from peers that announced a higher height, and
//! applies the blocks strictly in order through the same validation and
//! re-execution path consensus uses.
//!
//! All work happens in [`BlockSync::tick`]: expire lapsed requests, apply
//! whatever is next in line, then issue new requests. Inbound blocks only
//! land in the download queue. A block failing its commit check or
//! validation is discarded and fetched again from a different peer.

mod runner;

pub use runner::SyncRunner;

use crate::config::SyncConfig;
use crate::domain::{
    estimate_remaining, verify_commit_votes, DownloadQueue, QueueLimits, SyncError, SyncProgress,
    SyncResult,
};
use crate::ports::{SyncChain, SyncManager};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use shared_bus::{Channel, PeerInfo};
use shared_types::{short_hash, Block, DisconnectReason, PeerId, SyncMessage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

#[cfg(test)]
mod tests;

struct SyncState {
    /// Present while a run is active.
    queue: Option<DownloadQueue>,
    starting_height: u64,
    target: u64,
    started: Instant,
    /// Time of the last applied block, or of the first tick of the run.
    last_progress: Option<u64>,
}

enum Next {
    Apply(Block, PeerId),
    Done,
    Wait,
}

pub struct BlockSync {
    config: SyncConfig,
    chain: Arc<dyn SyncChain>,
    channel: Arc<dyn Channel>,
    state: Mutex<SyncState>,
    running: watch::Sender<bool>,
}

impl BlockSync {
    pub fn new(config: SyncConfig, chain: Arc<dyn SyncChain>, channel: Arc<dyn Channel>) -> Self {
        let (running, _) = watch::channel(false);
        Self {
            config,
            chain,
            channel,
            state: Mutex::new(SyncState {
                queue: None,
                starting_height: 0,
                target: 0,
                started: Instant::now(),
                last_progress: None,
            }),
            running,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn limits(&self) -> QueueLimits {
        QueueLimits {
            max_queued: self.config.max_queued_jobs.max(1),
            max_pending: self.config.max_pending_jobs.max(1),
            max_blocks: self.config.max_pending_blocks.max(1),
        }
    }

    /// Resolves once no run is active.
    pub async fn wait_until_done(&self) {
        let mut running = self.running.subscribe();
        let _ = running.wait_for(|running| !running).await;
    }

    /// One round of work at local time `now` (ms).
    ///
    /// Returns the error that ended the run, if any. A fatal error means
    /// the chain can no longer be written.
    pub fn tick(&self, now: u64) -> SyncResult<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.handle_timeouts(now);
        self.process(now)?;
        if !self.is_running() {
            return Ok(());
        }
        self.check_idle(now)?;
        self.download(now);
        Ok(())
    }

    fn handle_timeouts(&self, now: u64) {
        let mut state = self.state.lock();
        let Some(queue) = state.queue.as_mut() else {
            return;
        };
        for (height, peer) in queue.expire(now) {
            debug!(height, peer = %peer, "Block request timed out");
        }
    }

    fn check_idle(&self, now: u64) -> SyncResult<()> {
        let idle_ms = {
            let mut state = self.state.lock();
            if state.queue.is_none() {
                return Ok(());
            }
            let since = *state.last_progress.get_or_insert(now);
            now.saturating_sub(since)
        };
        if idle_ms <= self.config.max_idle_ms {
            return Ok(());
        }
        let height = self.chain.latest_height();
        warn!(height, idle_ms, "Sync stalled");
        self.finish();
        Err(SyncError::Stalled { height, idle_ms })
    }

    /// Request queued heights from peers that have them.
    fn download(&self, now: u64) {
        let peers = self.channel.peers();
        let mut rng = rand::thread_rng();
        let mut state = self.state.lock();
        let Some(queue) = state.queue.as_mut() else {
            return;
        };

        while let Some(height) = queue.next_request() {
            let candidates: Vec<&PeerInfo> =
                peers.iter().filter(|peer| peer.latest_height > height).collect();
            let preferred: Vec<&PeerInfo> = match queue.avoided(height) {
                Some(bad) => candidates.iter().copied().filter(|peer| peer.id != bad).collect(),
                None => Vec::new(),
            };
            let pool = if preferred.is_empty() { &candidates } else { &preferred };

            let Some(peer) = pool.choose(&mut rng) else {
                trace!(height, "No peer has this height yet");
                queue.requeue(height);
                break;
            };
            match self.channel.send(&peer.id, SyncMessage::GetBlock(height).into()) {
                Ok(()) => {
                    trace!(height, peer = %peer.id, "Requested block");
                    queue.mark_requested(height, peer.id, now + self.config.download_timeout_ms);
                }
                Err(e) => {
                    debug!(height, peer = %peer.id, error = %e, "Block request not sent");
                    queue.requeue(height);
                    break;
                }
            }
        }
    }

    /// Apply downloaded blocks that are next in line.
    fn process(&self, now: u64) -> SyncResult<()> {
        loop {
            let next = {
                let mut state = self.state.lock();
                let target = state.target;
                match state.queue.as_mut() {
                    None => return Ok(()),
                    Some(queue) => {
                        let expected = self.chain.latest_height() + 1;
                        if expected >= target {
                            Next::Done
                        } else {
                            queue
                                .pop_next(expected)
                                .map_or(Next::Wait, |(block, peer)| Next::Apply(block, peer))
                        }
                    }
                }
            };

            let (block, from) = match next {
                Next::Apply(block, from) => (block, from),
                Next::Done => {
                    self.finish();
                    return Ok(());
                }
                Next::Wait => return Ok(()),
            };

            let height = block.height();
            match self.apply(&block, now) {
                Ok(()) => {
                    self.state.lock().last_progress = Some(now);
                }
                Err(e) if e.is_fatal() => {
                    error!(height, error = %e, "Cannot apply synced block");
                    self.finish();
                    return Err(e);
                }
                Err(e) => {
                    warn!(height, peer = %from, error = %e, "Discarding synced block");
                    if let Some(queue) = self.state.lock().queue.as_mut() {
                        queue.requeue_avoiding(height, from);
                    }
                    if self.config.disconnect_on_invalid_block {
                        self.channel.disconnect(&from, DisconnectReason::BadBlock);
                    }
                    return Ok(());
                }
            }
        }
    }

    fn apply(&self, block: &Block, now: u64) -> SyncResult<()> {
        verify_commit_votes(block, &self.chain.validators()).map_err(|reason| {
            SyncError::InvalidCommit {
                height: block.height(),
                reason,
            }
        })?;
        let executed = self.chain.validate_block(block, now)?;
        self.chain.import_block(executed, block.votes.clone())?;
        trace!(height = block.height(), hash = %short_hash(&block.hash()), "Synced block");
        Ok(())
    }

    fn finish(&self) {
        let was_running = {
            let mut state = self.state.lock();
            state.queue.take().is_some()
        };
        self.running.send_replace(false);
        if was_running {
            info!(height = self.chain.latest_height(), "Sync finished");
        }
    }

    fn serve(&self, to: &PeerId, height: u64, header_only: bool) -> SyncResult<()> {
        let reply = if header_only {
            self.chain
                .header(height)?
                .map(|header| SyncMessage::BlockHeader(Box::new(header)))
        } else {
            self.chain
                .block(height)?
                .map(|block| SyncMessage::Block(Box::new(block)))
        };
        let Some(reply) = reply else {
            trace!(height, peer = %to, "Requested height not found");
            return Ok(());
        };
        if let Err(e) = self.channel.send(to, reply.into()) {
            debug!(height, peer = %to, error = %e, "Reply not sent");
        }
        Ok(())
    }
}

impl SyncManager for BlockSync {
    fn start(&self, target: u64) -> SyncResult<()> {
        let head = self.chain.latest_height();
        let mut state = self.state.lock();
        if state.queue.is_some() {
            return Err(SyncError::AlreadyRunning);
        }
        state.starting_height = head;
        state.target = target;
        state.started = Instant::now();
        state.last_progress = None;

        if target <= head + 1 {
            debug!(head, target, "Sync target already reached");
            return Ok(());
        }
        state.queue = Some(DownloadQueue::new(head + 1, target, self.limits()));
        self.running.send_replace(true);
        info!(from = head + 1, target, "Sync started");
        Ok(())
    }

    fn stop(&self) {
        if self.is_running() {
            info!("Stopping sync");
        }
        self.finish();
    }

    fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    fn on_message(&self, from: PeerId, message: SyncMessage) -> SyncResult<()> {
        match message {
            SyncMessage::GetBlock(height) => self.serve(&from, height, false),
            SyncMessage::GetBlockHeader(height) => self.serve(&from, height, true),
            SyncMessage::Block(block) => {
                let height = block.height();
                let accepted = self
                    .state
                    .lock()
                    .queue
                    .as_mut()
                    .is_some_and(|queue| queue.on_block(from, *block));
                if !accepted {
                    trace!(height, peer = %from, "Ignoring unrequested block");
                }
                Ok(())
            }
            SyncMessage::BlockHeader(header) => {
                trace!(height = header.height, peer = %from, "Ignoring block header");
                Ok(())
            }
        }
    }

    fn progress(&self) -> SyncProgress {
        let state = self.state.lock();
        let current = self.chain.latest_height();
        let applied = current.saturating_sub(state.starting_height);
        let remaining = state.target.saturating_sub(current + 1);
        let elapsed = if state.queue.is_some() {
            state.started.elapsed()
        } else {
            Duration::ZERO
        };
        SyncProgress {
            starting_height: state.starting_height,
            current_height: current,
            target_height: state.target,
            estimated_time_remaining: estimate_remaining(elapsed, applied, remaining),
        }
    }
}
