//! # Download Queue
//!
//! Tracks every height of a sync run through three stages:
//!
//! ```text
//! to_download ──next_request──→ in_flight ──on_block──→ downloaded ──pop_next──→ applied
//!      ↑                            │                        │
//!      └──────── expire / requeue ──┴────────────────────────┘
//! ```
//!
//! Heights are queued lazily so a sync over millions of blocks keeps at most
//! `max_queued` entries waiting. Requests stop being handed out while
//! `max_pending` are in flight or `max_blocks` downloaded blocks wait for
//! their turn.
//!
//! The queue is pure bookkeeping: it never touches the network or the chain.

use shared_types::{Block, PeerId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Bounds of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimits {
    pub max_queued: usize,
    pub max_pending: usize,
    pub max_blocks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Request {
    peer: PeerId,
    deadline: u64,
}

#[derive(Debug)]
pub struct DownloadQueue {
    limits: QueueLimits,
    /// Lowest height never queued.
    next_to_queue: u64,
    /// Exclusive upper bound.
    target: u64,
    to_download: BTreeSet<u64>,
    in_flight: HashMap<u64, Request>,
    downloaded: BTreeMap<u64, (Block, PeerId)>,
    /// Peer that last failed each height.
    avoid: HashMap<u64, PeerId>,
}

impl DownloadQueue {
    /// Queue for heights in `[from, target)`.
    pub fn new(from: u64, target: u64, limits: QueueLimits) -> Self {
        let mut queue = Self {
            limits,
            next_to_queue: from,
            target,
            to_download: BTreeSet::new(),
            in_flight: HashMap::new(),
            downloaded: BTreeMap::new(),
            avoid: HashMap::new(),
        };
        queue.refill();
        queue
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    fn refill(&mut self) {
        while self.to_download.len() < self.limits.max_queued && self.next_to_queue < self.target
        {
            self.to_download.insert(self.next_to_queue);
            self.next_to_queue += 1;
        }
    }

    /// Lowest height that may be requested now, removed from the queue.
    ///
    /// Callers must either [`Self::mark_requested`] or [`Self::requeue`] it.
    pub fn next_request(&mut self) -> Option<u64> {
        if self.in_flight.len() >= self.limits.max_pending
            || self.downloaded.len() >= self.limits.max_blocks
        {
            return None;
        }
        self.refill();
        self.to_download.pop_first()
    }

    pub fn mark_requested(&mut self, height: u64, peer: PeerId, deadline: u64) {
        self.in_flight.insert(height, Request { peer, deadline });
    }

    /// Put `height` back to be requested again.
    pub fn requeue(&mut self, height: u64) {
        if height < self.target {
            self.to_download.insert(height);
        }
    }

    /// Put `height` back, preferring a peer other than `peer` next time.
    pub fn requeue_avoiding(&mut self, height: u64, peer: PeerId) {
        self.avoid.insert(height, peer);
        self.requeue(height);
    }

    /// Peer that should not serve `height` again if another can.
    pub fn avoided(&self, height: u64) -> Option<PeerId> {
        self.avoid.get(&height).copied()
    }

    /// Accept a block answering an outstanding request to `from`.
    ///
    /// Unsolicited blocks, and answers from a peer other than the one asked,
    /// are refused.
    pub fn on_block(&mut self, from: PeerId, block: Block) -> bool {
        let height = block.height();
        match self.in_flight.get(&height) {
            Some(request) if request.peer == from => {
                self.in_flight.remove(&height);
                self.downloaded.insert(height, (block, from));
                true
            }
            _ => false,
        }
    }

    /// Requests whose deadline has passed at `now`, requeued away from the
    /// peer that let them lapse.
    pub fn expire(&mut self, now: u64) -> Vec<(u64, PeerId)> {
        let mut expired: Vec<(u64, PeerId)> = self
            .in_flight
            .iter()
            .filter(|(_, request)| request.deadline <= now)
            .map(|(height, request)| (*height, request.peer))
            .collect();
        expired.sort_unstable_by_key(|(height, _)| *height);
        for (height, peer) in &expired {
            self.in_flight.remove(height);
            self.requeue_avoiding(*height, *peer);
        }
        expired
    }

    /// Next downloaded block if it is the one at `expected`.
    ///
    /// Downloaded blocks below `expected` are stale and dropped.
    pub fn pop_next(&mut self, expected: u64) -> Option<(Block, PeerId)> {
        while let Some(entry) = self.downloaded.first_entry() {
            if *entry.key() < expected {
                entry.remove();
                continue;
            }
            if *entry.key() == expected {
                let (block, peer) = entry.remove();
                self.avoid.remove(&expected);
                return Some((block, peer));
            }
            return None;
        }
        None
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn downloaded(&self) -> usize {
        self.downloaded.len()
    }

    pub fn queued(&self) -> usize {
        self.to_download.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::BlockHeader;

    const PEER_A: PeerId = PeerId([1u8; 32]);
    const PEER_B: PeerId = PeerId([2u8; 32]);

    fn limits() -> QueueLimits {
        QueueLimits {
            max_queued: 4,
            max_pending: 2,
            max_blocks: 3,
        }
    }

    fn block(height: u64) -> Block {
        Block::new(
            BlockHeader {
                height,
                view: 0,
                coinbase: [0u8; 20],
                parent_hash: [0u8; 32],
                timestamp: height,
                transactions_root: [0u8; 32],
                results_root: [0u8; 32],
                state_root: [0u8; 32],
                data: Vec::new(),
            },
            Vec::new(),
        )
    }

    #[test]
    fn test_queues_lazily_up_to_target() {
        let mut queue = DownloadQueue::new(10, 1_000_000, limits());
        assert_eq!(queue.queued(), 4);
        assert_eq!(queue.next_request(), Some(10));
        queue.mark_requested(10, PEER_A, 100);
        assert_eq!(queue.next_request(), Some(11));
        queue.mark_requested(11, PEER_A, 100);
        // Two in flight is the limit.
        assert_eq!(queue.next_request(), None);
        assert_eq!(queue.queued(), 3);
    }

    #[test]
    fn test_empty_range_has_nothing_to_request() {
        let mut queue = DownloadQueue::new(5, 5, limits());
        assert_eq!(queue.next_request(), None);
    }

    #[test]
    fn test_unsolicited_and_misrouted_blocks_refused() {
        let mut queue = DownloadQueue::new(1, 10, limits());
        assert!(!queue.on_block(PEER_A, block(1)));

        let height = queue.next_request().unwrap();
        queue.mark_requested(height, PEER_A, 100);
        assert!(!queue.on_block(PEER_B, block(height)));
        assert!(queue.on_block(PEER_A, block(height)));
        assert_eq!(queue.in_flight(), 0);
        assert_eq!(queue.downloaded(), 1);
    }

    #[test]
    fn test_blocks_pop_in_height_order_only() {
        let mut queue = DownloadQueue::new(1, 10, limits());
        for _ in 0..2 {
            let height = queue.next_request().unwrap();
            queue.mark_requested(height, PEER_A, 100);
        }
        assert!(queue.on_block(PEER_A, block(2)));
        assert_eq!(queue.pop_next(1), None);

        assert!(queue.on_block(PEER_A, block(1)));
        assert_eq!(queue.pop_next(1).unwrap().0.height(), 1);
        assert_eq!(queue.pop_next(2).unwrap().0.height(), 2);
        assert_eq!(queue.pop_next(3), None);
    }

    #[test]
    fn test_stale_blocks_dropped() {
        let mut queue = DownloadQueue::new(1, 10, limits());
        let height = queue.next_request().unwrap();
        queue.mark_requested(height, PEER_A, 100);
        assert!(queue.on_block(PEER_A, block(height)));
        assert_eq!(queue.pop_next(5), None);
        assert_eq!(queue.downloaded(), 0);
    }

    #[test]
    fn test_expired_requests_requeued_away_from_peer() {
        let mut queue = DownloadQueue::new(1, 10, limits());
        queue.next_request();
        queue.mark_requested(1, PEER_A, 50);
        queue.next_request();
        queue.mark_requested(2, PEER_B, 500);

        assert_eq!(queue.expire(100), vec![(1, PEER_A)]);
        assert_eq!(queue.avoided(1), Some(PEER_A));
        assert_eq!(queue.next_request(), Some(1));
        // The late answer no longer counts.
        assert!(!queue.on_block(PEER_A, block(1)));
    }

    #[test]
    fn test_downloaded_backlog_pauses_requests() {
        let mut queue = DownloadQueue::new(
            1,
            100,
            QueueLimits {
                max_queued: 10,
                max_pending: 10,
                max_blocks: 2,
            },
        );
        for _ in 0..2 {
            let height = queue.next_request().unwrap();
            queue.mark_requested(height, PEER_A, 100);
            assert!(queue.on_block(PEER_A, block(height)));
        }
        assert_eq!(queue.next_request(), None);
        queue.pop_next(1);
        assert_eq!(queue.next_request(), Some(3));
    }

    proptest! {
        #[test]
        fn prop_every_height_requested_once_in_order(from in 0u64..1_000, len in 0u64..200) {
            let target = from + len;
            let mut queue = DownloadQueue::new(from, target, QueueLimits {
                max_queued: 8,
                max_pending: 4,
                max_blocks: 4,
            });
            let mut applied = Vec::new();
            let mut next = from;
            loop {
                while let Some(height) = queue.next_request() {
                    queue.mark_requested(height, PEER_A, 0);
                    prop_assert!(queue.on_block(PEER_A, block(height)));
                }
                let mut progressed = false;
                while let Some((block, _)) = queue.pop_next(next) {
                    applied.push(block.height());
                    next += 1;
                    progressed = true;
                }
                if !progressed {
                    break;
                }
            }
            prop_assert_eq!(applied, (from..target).collect::<Vec<_>>());
        }
    }
}
