//! Queue a mutation for later delivery

use crate::config::Config;
use anyhow::{Context, Result};
use outbox_core::{Target, Verb};
use outbox_store::PersistentQueue;
use owo_colors::OwoColorize;

pub fn run(config: &Config, resource: &str, verb: Verb, payload: &str) -> Result<()> {
    let payload: serde_json::Value =
        serde_json::from_str(payload).context("Payload is not valid JSON")?;

    let queue = PersistentQueue::open(config.open_storage()?);
    let id = queue.enqueue(Target::new(resource, verb), payload);

    println!(
        "Queued {} {} as {} ({} pending)",
        verb,
        resource.cyan(),
        id.to_string().yellow(),
        queue.len()
    );
    Ok(())
}
