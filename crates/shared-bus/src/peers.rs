//! Last announced height per peer.

use parking_lot::RwLock;
use shared_types::PeerId;
use std::collections::HashMap;

/// Thread-safe table of peer heights.
#[derive(Debug, Default)]
pub struct PeerTable {
    heights: RwLock<HashMap<PeerId, u64>>,
}

impl PeerTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a height announcement. Heights never move backwards.
    pub fn update_height(&self, peer: PeerId, height: u64) {
        let mut heights = self.heights.write();
        let entry = heights.entry(peer).or_insert(0);
        *entry = (*entry).max(height);
    }

    /// Last announced height of `peer`, if known.
    pub fn height(&self, peer: &PeerId) -> Option<u64> {
        self.heights.read().get(peer).copied()
    }

    /// Snapshot of all known heights.
    pub fn heights(&self) -> HashMap<PeerId, u64> {
        self.heights.read().clone()
    }

    /// Forget a peer.
    pub fn remove(&self, peer: &PeerId) {
        self.heights.write().remove(peer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_is_monotonic() {
        let table = PeerTable::new();
        let peer = PeerId([1u8; 32]);

        table.update_height(peer, 10);
        table.update_height(peer, 7);
        assert_eq!(table.height(&peer), Some(10));

        table.remove(&peer);
        assert_eq!(table.height(&peer), None);
        assert!(table.heights().is_empty());
    }
}
