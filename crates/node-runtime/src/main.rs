//! # Node Runtime
//!
//! Entry point of the node hosting the KV record subsystem.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration from the environment
//! 3. Restore the KV store and start periodic dumps
//! 4. Wait for Ctrl+C, then dump once more and exit

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = NodeConfig::from_env();
    config.validate().context("Invalid node configuration")?;

    let runtime = NodeRuntime::new(config);
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let outcome = runtime.shutdown().await?;
    info!(
        "[qc-18] Final dump: {} records in {}ms",
        outcome.records,
        outcome.elapsed.as_millis()
    );

    Ok(())
}
