//! Drain the queue through the remote now

use crate::config::Config;
use anyhow::Result;
use outbox_store::PersistentQueue;
use outbox_sync::{Dispatcher, DrainOutcome, RetryPolicy};
use owo_colors::OwoColorize;
use std::sync::Arc;

pub async fn run(config: &Config) -> Result<()> {
    let queue = Arc::new(PersistentQueue::open(config.open_storage()?));
    if queue.is_empty() {
        println!("{}", "Queue is empty".dimmed());
        return Ok(());
    }

    let dispatcher = Dispatcher::new(queue.clone(), config.gateway()?, RetryPolicy::default());

    match dispatcher.flush().await {
        DrainOutcome::Completed(report) => {
            println!(
                "Drained: {} delivered, {} retained, {} dropped",
                report.delivered.to_string().green(),
                report.retained.to_string().yellow(),
                report.dropped.to_string().red()
            );
        }
        // One-shot invocation holds the only dispatcher, so this is unreachable
        DrainOutcome::Skipped => println!("{}", "A drain is already in flight".yellow()),
    }
    Ok(())
}
