//! # Message Routing
//!
//! One task drains the inbound subscription and hands every message to its
//! subsystem. Routing never blocks: consensus messages go through the
//! runner's queue, sync and pool calls are short and synchronous.

use dc_03_consensus::BftHandle;
use dc_04_block_sync::{BlockSync, SyncManager};
use dc_05_transaction_pool::{TransactionPool, TransactionPoolApi};
use shared_bus::{Channel, Envelope, Subscription};
use shared_types::{short_hash, Message, Transaction};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Destinations of inbound messages.
#[derive(Clone)]
pub struct MessageRoutes {
    pub consensus: BftHandle,
    pub sync: Arc<BlockSync>,
    pub pool: Arc<TransactionPool>,
    pub channel: Arc<dyn Channel>,
}

impl MessageRoutes {
    /// Deliver one inbound message.
    pub fn route(&self, envelope: Envelope) {
        let Envelope { from, message } = envelope;
        trace!(peer = %from, kind = message.kind(), "Routing message");
        match message {
            Message::Consensus(message) => {
                if let Err(e) = self.consensus.on_message(from, message) {
                    debug!(peer = %from, error = %e, "Consensus message dropped");
                }
            }
            Message::Sync(message) => {
                if let Err(e) = self.sync.on_message(from, message) {
                    warn!(peer = %from, error = %e, "Sync message failed");
                }
            }
            Message::Transaction(tx) => {
                self.relay(*tx);
            }
            Message::Disconnect(reason) => {
                info!(peer = %from, ?reason, "Peer disconnected");
            }
        }
    }

    /// Admit a gossiped transaction and pass it on when it is new and valid.
    pub fn relay(&self, tx: Transaction) {
        let hash = tx.hash;
        match self.pool.add_transaction(tx.clone()) {
            Ok(_) => {
                let peers = self.channel.broadcast(Message::Transaction(Box::new(tx)));
                trace!(tx = %short_hash(&hash), peers, "Relayed transaction");
            }
            Err(e) => debug!(tx = %short_hash(&hash), code = ?e.code(), "Not relaying transaction"),
        }
    }
}

/// The routing task.
pub struct Dispatcher {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Dispatcher {
    pub fn spawn(inbox: Subscription, routes: MessageRoutes) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(inbox, routes, shutdown_rx));
        Self { shutdown, task }
    }

    /// Stop routing and wait for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Dispatcher task panicked");
        }
    }
}

async fn run(mut inbox: Subscription, routes: MessageRoutes, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            envelope = inbox.recv() => match envelope {
                Some(envelope) => routes.route(envelope),
                None => {
                    info!("Network channel closed");
                    break;
                }
            },
        }
    }
    debug!("Dispatcher stopped");
}
