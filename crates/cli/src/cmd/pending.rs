//! List queued mutations

use crate::config::Config;
use anyhow::Result;
use outbox_core::current_timestamp_ms;
use outbox_store::PersistentQueue;
use owo_colors::OwoColorize;

pub fn run(config: &Config) -> Result<()> {
    let queue = PersistentQueue::open(config.open_storage()?);
    let items = queue.drain();

    if items.is_empty() {
        println!("{}", "No pending mutations".dimmed());
        return Ok(());
    }

    println!("{}", format!("{} pending mutation(s)", items.len()).bold());
    let now = current_timestamp_ms();
    for item in items {
        let age_secs = now.saturating_sub(item.created_at_ms) / 1000;
        let id = item.id.to_string();
        let id_short = &id[..8];
        println!(
            "  {}  {:6} {}  age {}s  attempts {}",
            id_short.yellow(),
            item.target.verb.to_string(),
            item.target.resource.cyan(),
            age_secs,
            item.attempts
        );
    }
    Ok(())
}
