//! # In-Memory Network
//!
//! A hub connecting every joined node to every other. Messages are delivered
//! through unbounded queues in send order. A node can be taken offline, in
//! which case traffic to and from it is silently dropped.
//!
//! `NEW_HEIGHT` announcements update the receiver's [`PeerTable`] as they
//! pass through, the way a socket transport tracks peer status.

use crate::channel::{Channel, ChannelError, Envelope, PeerInfo, Subscription};
use crate::peers::PeerTable;
use parking_lot::RwLock;
use shared_types::{ConsensusMessage, DisconnectReason, Message, PeerId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

struct Node {
    sender: mpsc::UnboundedSender<Envelope>,
    peers: Arc<PeerTable>,
    online: bool,
    /// Peers this node has disconnected from, or been disconnected by.
    banned: HashSet<PeerId>,
}

#[derive(Default)]
struct Hub {
    nodes: HashMap<PeerId, Node>,
}

impl Hub {
    fn linked(&self, a: &PeerId, b: &PeerId) -> bool {
        match (self.nodes.get(a), self.nodes.get(b)) {
            (Some(na), Some(nb)) => {
                a != b && na.online && nb.online && !na.banned.contains(b) && !nb.banned.contains(a)
            }
            _ => false,
        }
    }

    fn deliver(&self, from: &PeerId, to: &PeerId, message: Message) -> bool {
        if !self.linked(from, to) {
            return false;
        }
        let Some(node) = self.nodes.get(to) else {
            return false;
        };
        if let Message::Consensus(ConsensusMessage::NewHeight(height)) = &message {
            node.peers.update_height(*from, *height);
        }
        trace!(from = %from, to = %to, kind = message.kind(), "Delivering message");
        node.sender
            .send(Envelope {
                from: *from,
                message,
            })
            .is_ok()
    }
}

/// Process-local hub.
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    hub: Arc<RwLock<Hub>>,
}

impl InMemoryNetwork {
    /// Empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node. Joining again with the same id replaces the old queue.
    pub fn join(&self, id: PeerId) -> (MemoryChannel, Subscription) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let peers = Arc::new(PeerTable::new());
        self.hub.write().nodes.insert(
            id,
            Node {
                sender,
                peers: Arc::clone(&peers),
                online: true,
                banned: HashSet::new(),
            },
        );
        debug!(peer = %id, "Node joined in-memory network");
        (
            MemoryChannel {
                id,
                hub: Arc::clone(&self.hub),
                peers,
            },
            Subscription::new(receiver),
        )
    }

    /// Bring a node online or take it offline.
    pub fn set_online(&self, id: &PeerId, online: bool) {
        if let Some(node) = self.hub.write().nodes.get_mut(id) {
            node.online = online;
        }
    }

    /// Number of joined nodes.
    pub fn len(&self) -> usize {
        self.hub.read().nodes.len()
    }

    /// Whether no node has joined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One node's handle on the hub.
#[derive(Clone)]
pub struct MemoryChannel {
    id: PeerId,
    hub: Arc<RwLock<Hub>>,
    peers: Arc<PeerTable>,
}

impl MemoryChannel {
    /// Heights announced to this node.
    pub fn peer_table(&self) -> &PeerTable {
        &self.peers
    }
}

impl Channel for MemoryChannel {
    fn local_peer(&self) -> PeerId {
        self.id
    }

    fn broadcast(&self, message: Message) -> usize {
        let hub = self.hub.read();
        let mut delivered = 0;
        for peer in hub.nodes.keys() {
            if hub.deliver(&self.id, peer, message.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    fn send(&self, peer: &PeerId, message: Message) -> Result<(), ChannelError> {
        let hub = self.hub.read();
        if !hub.nodes.contains_key(&self.id) {
            return Err(ChannelError::Closed);
        }
        if hub.deliver(&self.id, peer, message) {
            Ok(())
        } else {
            Err(ChannelError::NotConnected(*peer))
        }
    }

    fn disconnect(&self, peer: &PeerId, reason: DisconnectReason) {
        let mut hub = self.hub.write();
        hub.deliver(&self.id, peer, Message::Disconnect(reason));
        if let Some(node) = hub.nodes.get_mut(&self.id) {
            node.banned.insert(*peer);
        }
        if let Some(node) = hub.nodes.get_mut(peer) {
            node.banned.insert(self.id);
            node.peers.remove(&self.id);
        }
        self.peers.remove(peer);
        debug!(peer = %peer, ?reason, "Disconnected peer");
    }

    fn peers(&self) -> Vec<PeerInfo> {
        let hub = self.hub.read();
        let mut peers: Vec<PeerInfo> = hub
            .nodes
            .keys()
            .filter(|peer| hub.linked(&self.id, peer))
            .map(|peer| PeerInfo {
                id: *peer,
                latest_height: self.peers.height(peer).unwrap_or(0),
            })
            .collect();
        peers.sort_by_key(|info| info.id);
        peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::SyncMessage;

    fn id(n: u8) -> PeerId {
        PeerId([n; 32])
    }

    #[test]
    fn test_broadcast_reaches_other_nodes() {
        let network = InMemoryNetwork::new();
        let (a, mut a_sub) = network.join(id(1));
        let (_b, mut b_sub) = network.join(id(2));
        let (_c, mut c_sub) = network.join(id(3));

        assert_eq!(a.broadcast(Message::from(SyncMessage::GetBlock(1))), 2);
        assert!(a_sub.try_recv().unwrap().is_none());
        assert_eq!(b_sub.try_recv().unwrap().unwrap().from, id(1));
        assert_eq!(c_sub.try_recv().unwrap().unwrap().from, id(1));
    }

    #[test]
    fn test_offline_node_is_unreachable() {
        let network = InMemoryNetwork::new();
        let (a, _a_sub) = network.join(id(1));
        let (_b, mut b_sub) = network.join(id(2));

        network.set_online(&id(2), false);
        assert!(a.peers().is_empty());
        assert_eq!(
            a.send(&id(2), Message::from(SyncMessage::GetBlock(1))),
            Err(ChannelError::NotConnected(id(2)))
        );
        assert!(b_sub.try_recv().unwrap().is_none());

        network.set_online(&id(2), true);
        assert_eq!(a.peers().len(), 1);
    }

    #[test]
    fn test_new_height_updates_peer_table() {
        let network = InMemoryNetwork::new();
        let (a, _a_sub) = network.join(id(1));
        let (b, _b_sub) = network.join(id(2));

        a.broadcast(Message::from(ConsensusMessage::NewHeight(42)));
        assert_eq!(
            b.peers(),
            vec![PeerInfo {
                id: id(1),
                latest_height: 42
            }]
        );
    }

    #[test]
    fn test_disconnect_notifies_and_unlinks() {
        let network = InMemoryNetwork::new();
        let (a, _a_sub) = network.join(id(1));
        let (b, mut b_sub) = network.join(id(2));

        a.disconnect(&id(2), DisconnectReason::BadBlock);
        let envelope = b_sub.try_recv().unwrap().unwrap();
        assert_eq!(envelope.message, Message::Disconnect(DisconnectReason::BadBlock));
        assert!(a.peers().is_empty());
        assert!(b.peers().is_empty());
        assert_eq!(a.broadcast(Message::from(SyncMessage::GetBlock(1))), 0);
    }

    #[tokio::test]
    async fn test_async_recv() {
        let network = InMemoryNetwork::new();
        let (a, _a_sub) = network.join(id(1));
        let (_b, mut b_sub) = network.join(id(2));

        a.send(&id(2), Message::from(SyncMessage::GetBlockHeader(3)))
            .unwrap();
        let envelope = b_sub.recv().await.unwrap();
        assert_eq!(envelope.message, Message::from(SyncMessage::GetBlockHeader(3)));
    }
}
