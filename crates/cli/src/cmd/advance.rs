//! Advance an owner's progress, remote-first

use crate::config::Config;
use anyhow::{Context, Result};
use outbox_store::SnapshotCache;
use outbox_sync::Reconciler;
use owo_colors::OwoColorize;
use std::sync::Arc;

pub async fn run(config: &Config, owner: &str, step: u64, data: &str) -> Result<()> {
    let data: serde_json::Value = serde_json::from_str(data).context("Data is not valid JSON")?;

    let cache = Arc::new(SnapshotCache::new(config.open_storage()?));
    let reconciler = Reconciler::new(cache, config.gateway()?);

    // A failure here propagates: the step was not confirmed and must not be
    // reported as advanced.
    reconciler
        .advance(owner, step, data)
        .await
        .with_context(|| format!("Failed to advance {} to step {}", owner, step))?;

    println!(
        "Advanced {} to step {} {}",
        owner.cyan(),
        step.to_string().green(),
        "(confirmed)".dimmed()
    );
    Ok(())
}
