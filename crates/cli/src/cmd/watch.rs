//! Probe connectivity and drain automatically on reconnect

use crate::config::Config;
use anyhow::{Context, Result};
use outbox_gateway::Prober;
use outbox_store::PersistentQueue;
use outbox_sync::{ConnectivityMonitor, Dispatcher, RetryPolicy};
use owo_colors::OwoColorize;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(config: &Config, period_secs: u64) -> Result<()> {
    let queue = Arc::new(PersistentQueue::open(config.open_storage()?));
    let dispatcher = Arc::new(Dispatcher::new(
        queue.clone(),
        config.gateway()?,
        RetryPolicy::default(),
    ));

    let (prober, reachability) = Prober::new(config.remote_url()?, Duration::from_secs(period_secs));
    let prober_handle = prober.spawn();
    let monitor_handle = ConnectivityMonitor::new(dispatcher, reachability).spawn();

    println!(
        "Watching {} every {}s, {} pending. {}",
        config.remote_url()?.cyan(),
        period_secs,
        queue.len(),
        "Ctrl-C to stop".dimmed()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    // Stopping the prober drops the watch sender, which ends the monitor
    prober_handle.abort();
    let _ = prober_handle.await;
    monitor_handle.await?;

    println!("Stopped ({} still pending)", queue.len());
    Ok(())
}
