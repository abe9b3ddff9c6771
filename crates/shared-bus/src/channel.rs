//! # Channel Port
//!
//! What the core needs from the transport: fan-out, unicast, disconnect,
//! and the peers currently connected with their last announced height.

use shared_types::{DisconnectReason, Message, PeerId};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from channel operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Peer is not connected.
    #[error("peer {0} not connected")]
    NotConnected(PeerId),

    /// Local channel has been shut down.
    #[error("channel closed")]
    Closed,
}

/// A connected peer as seen by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: PeerId,
    /// Last height the peer announced through `NEW_HEIGHT`.
    pub latest_height: u64,
}

/// An inbound message and its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: PeerId,
    pub message: Message,
}

/// Outbound side of the peer network.
pub trait Channel: Send + Sync {
    /// Identity of the local node.
    fn local_peer(&self) -> PeerId;

    /// Send to every connected peer. Returns the number of recipients.
    fn broadcast(&self, message: Message) -> usize;

    /// Send to one peer.
    fn send(&self, peer: &PeerId, message: Message) -> Result<(), ChannelError>;

    /// Notify `peer` and drop the connection.
    fn disconnect(&self, peer: &PeerId, reason: DisconnectReason);

    /// Connected peers.
    fn peers(&self) -> Vec<PeerInfo>;
}

/// Inbound side of the peer network.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Envelope>,
}

impl Subscription {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<Envelope>) -> Self {
        Self { receiver }
    }

    /// Receive the next message, or `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }

    /// Receive without waiting.
    ///
    /// - `Ok(Some(envelope))` - a message was queued
    /// - `Ok(None)` - nothing queued
    /// - `Err(ChannelError::Closed)` - the channel was dropped
    pub fn try_recv(&mut self) -> Result<Option<Envelope>, ChannelError> {
        match self.receiver.try_recv() {
            Ok(envelope) => Ok(Some(envelope)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(ChannelError::Closed),
        }
    }
}
