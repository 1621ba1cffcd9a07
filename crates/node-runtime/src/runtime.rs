//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Build the subsystem container (scan targets, database handle)
//! 2. Restore the KV store from disk, or start empty
//! 3. Spawn the periodic dump task
//!
//! ## Shutdown Sequence
//!
//! 1. Signal the dump task and wait for it
//! 2. Run one final dump

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use qc_18_kv_records::DumpOutcome;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::container::{NodeConfig, RestoreOutcome, SubsystemContainer};

/// The node runtime owning the subsystem container.
pub struct NodeRuntime {
    /// Subsystem container with all initialized services.
    container: Arc<SubsystemContainer>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    /// Periodic dump task, present while running.
    dump_task: Mutex<Option<JoinHandle<()>>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Self {
        info!("Creating node runtime");

        let container = Arc::new(SubsystemContainer::new(config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            container,
            shutdown_tx,
            shutdown_rx,
            dump_task: Mutex::new(None),
        }
    }

    /// Restore persisted state and start background persistence.
    pub async fn start(&self) -> Result<RestoreOutcome> {
        info!("===========================================");
        info!("  KV Record Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let container = Arc::clone(&self.container);
        let restored = tokio::task::spawn_blocking(move || container.restore())
            .await
            .context("KV restore worker failed")?;

        let interval = self.container.config.kv.dump_interval;
        let task = tokio::spawn(run_periodic_dump(
            Arc::clone(&self.container),
            interval,
            self.shutdown_rx.clone(),
        ));
        *self.dump_task.lock() = Some(task);

        info!("Data Dir: {:?}", self.container.config.kv.data_dir);
        info!("Dump interval: {}s", interval.as_secs());
        Ok(restored)
    }

    /// Stop background persistence and write the store one last time.
    pub async fn shutdown(&self) -> Result<DumpOutcome> {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        let task = self.dump_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("[qc-18] Dump task ended abnormally: {}", e);
            }
        }

        let outcome = dump_in_background(&self.container).await?;
        info!("Shutdown complete");
        Ok(outcome)
    }

    /// Get a reference to the subsystem container.
    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }
}

/// Run one dump cycle on the blocking pool.
pub async fn dump_in_background(container: &Arc<SubsystemContainer>) -> Result<DumpOutcome> {
    let container = Arc::clone(container);
    let outcome = tokio::task::spawn_blocking(move || container.dump())
        .await
        .context("KV dump worker failed")?
        .context("KV dump refused or failed")?;
    Ok(outcome)
}

async fn run_periodic_dump(
    container: Arc<SubsystemContainer>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; the store was just restored.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = dump_in_background(&container).await {
                    error!("[qc-18] Periodic dump failed: {:#}", e);
                }
            }
            _ = shutdown.changed() => {
                info!("[qc-18] Shutdown signal received");
                break;
            }
        }
    }
}
