//! Outbox CLI - obx command

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use outbox_core::Verb;
use std::path::PathBuf;

mod cmd;
mod config;

/// Outbox - offline-first mutation queue with progress reconciliation
#[derive(Parser)]
#[command(name = "obx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Local store directory (default: .outbox)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Remote base URL
    #[arg(long, global = true)]
    remote: Option<String>,

    /// TOML config file supplying defaults for --store/--remote
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VerbArg {
    Post,
    Put,
    Patch,
    Delete,
}

impl From<VerbArg> for Verb {
    fn from(verb: VerbArg) -> Self {
        match verb {
            VerbArg::Post => Verb::Post,
            VerbArg::Put => Verb::Put,
            VerbArg::Patch => Verb::Patch,
            VerbArg::Delete => Verb::Delete,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a mutation for later delivery
    Enqueue {
        /// Resource path (e.g. /api/v1/packages/42)
        resource: String,
        /// JSON payload
        payload: String,
        /// Delivery verb
        #[arg(long, value_enum, default_value = "post")]
        verb: VerbArg,
    },
    /// List queued mutations
    Pending,
    /// Drain the queue through the remote now
    Flush,
    /// Reconcile an owner's progress with the remote
    Resume {
        /// Owner identifier
        owner: String,
    },
    /// Advance an owner's progress (confirmed remotely before caching)
    Advance {
        /// Owner identifier
        owner: String,
        /// New progress step
        step: u64,
        /// JSON data carried with the step
        #[arg(default_value = "{}")]
        data: String,
    },
    /// Probe connectivity and drain automatically on reconnect
    Watch {
        /// Probe period in seconds
        #[arg(long, default_value = "15")]
        period: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = config::Config::resolve(cli.store, cli.remote, cli.config)?;

    match cli.command {
        Commands::Enqueue {
            resource,
            payload,
            verb,
        } => cmd::enqueue::run(&config, &resource, verb.into(), &payload),
        Commands::Pending => cmd::pending::run(&config),
        Commands::Flush => cmd::flush::run(&config).await,
        Commands::Resume { owner } => cmd::resume::run(&config, &owner).await,
        Commands::Advance { owner, step, data } => {
            cmd::advance::run(&config, &owner, step, &data).await
        }
        Commands::Watch { period } => cmd::watch::run(&config, period).await,
    }
}
