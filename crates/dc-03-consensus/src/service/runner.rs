//! # Consensus Event Loop
//!
//! Owns a [`BftEngine`] on one tokio task and feeds it a merged stream of
//! inbound messages and phase deadlines. A deadline that passes with no
//! message is a timeout. When the engine asks for a sync, the loop awaits
//! the [`SyncService`] and then re-enters the new chain head.

use crate::domain::{ConsensusError, ConsensusResult, Step};
use crate::ports::{ConsensusApi, SyncService};
use crate::service::BftEngine;
use shared_types::{ConsensusMessage, PeerId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Sender side of a running engine.
#[derive(Clone)]
pub struct BftHandle {
    messages: mpsc::UnboundedSender<(PeerId, ConsensusMessage)>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl BftHandle {
    /// Queue an inbound consensus message.
    pub fn on_message(&self, from: PeerId, message: ConsensusMessage) -> ConsensusResult<()> {
        self.messages
            .send((from, message))
            .map_err(|_| ConsensusError::Stopped)
    }

    /// Ask the loop to stop. Idempotent.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow() || self.messages.is_closed()
    }
}

pub struct BftRunner {
    handle: BftHandle,
    task: JoinHandle<ConsensusResult<()>>,
}

impl BftRunner {
    /// Start `engine` on a new task.
    pub fn spawn(engine: BftEngine, sync: Arc<dyn SyncService>) -> Self {
        let (messages, inbox) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(engine, sync, inbox, shutdown_rx));
        Self {
            handle: BftHandle {
                messages,
                shutdown: Arc::new(shutdown),
            },
            task,
        }
    }

    pub fn handle(&self) -> BftHandle {
        self.handle.clone()
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) -> ConsensusResult<()> {
        self.handle.stop();
        self.join().await
    }

    /// Wait for the loop to exit on its own.
    pub async fn join(self) -> ConsensusResult<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Consensus task panicked");
                Err(ConsensusError::Stopped)
            }
        }
    }
}

async fn sleep_until_deadline(remaining: Option<u64>) {
    match remaining {
        Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        None => std::future::pending().await,
    }
}

async fn run(
    mut engine: BftEngine,
    sync: Arc<dyn SyncService>,
    mut inbox: mpsc::UnboundedReceiver<(PeerId, ConsensusMessage)>,
    mut shutdown: watch::Receiver<bool>,
) -> ConsensusResult<()> {
    let clock = Arc::clone(engine.clock());
    engine.start()?;

    loop {
        if *shutdown.borrow() {
            break;
        }
        let remaining = engine
            .deadline()
            .map(|deadline| deadline.saturating_sub(clock.now_millis()));

        let step = tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            message = inbox.recv() => match message {
                Some((from, message)) => engine.on_message(from, message),
                None => break,
            },
            _ = sleep_until_deadline(remaining) => engine.on_timeout(),
        };

        match step {
            Ok(Step::Continue) => {}
            Ok(Step::Sync(target)) => {
                info!(height = engine.height(), target, "Pausing consensus for sync");
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    result = sync.sync_to(target) => {
                        if let Err(e) = result {
                            warn!(target, error = %e, "Sync ended early");
                        }
                    }
                }
                if let Err(e) = engine.resync() {
                    if e.is_fatal() {
                        error!(error = %e, "Consensus halted");
                        engine.stop();
                        return Err(e);
                    }
                    warn!(error = %e, "Resync failed");
                }
            }
            Err(e) if e.is_fatal() => {
                error!(height = engine.height(), error = %e, "Consensus halted");
                engine.stop();
                return Err(e);
            }
            Err(e) => warn!(height = engine.height(), error = %e, "Consensus step failed"),
        }
    }

    engine.stop();
    Ok(())
}
