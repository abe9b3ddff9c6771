//! Periodic driver of a [`BlockSync`] on its own tokio task.

use crate::domain::{SyncError, SyncResult};
use crate::ports::SyncManager;
use crate::service::BlockSync;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub struct SyncRunner {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<SyncResult<()>>,
}

impl SyncRunner {
    /// Tick `sync` every `tick_interval` until shut down.
    pub fn spawn(sync: Arc<BlockSync>) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(sync, shutdown_rx));
        Self { shutdown, task }
    }

    /// Stop any active run and wait for the task to exit.
    pub async fn shutdown(self) -> SyncResult<()> {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Sync task panicked");
                Err(SyncError::Stopped)
            }
        }
    }
}

async fn run(sync: Arc<BlockSync>, mut shutdown: watch::Receiver<bool>) -> SyncResult<()> {
    let mut ticker = tokio::time::interval(sync.config().tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Sync loop started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                sync.stop();
                info!("Sync loop stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                match sync.tick(unix_millis()) {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => {
                        error!(error = %e, "Sync loop halted");
                        return Err(e);
                    }
                    Err(e) => warn!(error = %e, "Sync run ended early"),
                }
            }
        }
    }
}
