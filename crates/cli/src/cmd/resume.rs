//! Reconcile an owner's progress with the remote

use crate::config::Config;
use anyhow::Result;
use outbox_store::SnapshotCache;
use outbox_sync::Reconciler;
use owo_colors::OwoColorize;
use std::sync::Arc;

pub async fn run(config: &Config, owner: &str) -> Result<()> {
    let cache = Arc::new(SnapshotCache::new(config.open_storage()?));
    let reconciler = Reconciler::new(cache, config.gateway()?);

    match reconciler.resume(owner).await? {
        Some(winner) => {
            println!("{}", "Reconciled".bold());
            println!("  Owner:  {}", winner.owner_id.cyan());
            println!("  Step:   {}", winner.step.to_string().green());
            println!("  Data:   {}", winner.data);
        }
        None => {
            println!("{}", "No snapshot on either side".dimmed());
        }
    }
    Ok(())
}
