//! CLI configuration: flags merged over an optional TOML file

use anyhow::{Context, Result};
use outbox_core::StorageBackend;
use outbox_gateway::HttpGateway;
use outbox_store::SledStorage;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Shape of the optional config file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    store: Option<PathBuf>,
    remote: Option<String>,
}

/// Resolved configuration
pub struct Config {
    pub store_path: PathBuf,
    remote_url: Option<String>,
}

impl Config {
    /// Merge: flags win over the config file, which wins over defaults
    pub fn resolve(
        store: Option<PathBuf>,
        remote: Option<String>,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let file = match config_path {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str::<FileConfig>(&raw)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        Ok(Self {
            store_path: store
                .or(file.store)
                .unwrap_or_else(|| PathBuf::from(".outbox")),
            remote_url: remote.or(file.remote),
        })
    }

    /// Remote base URL; required only by commands that talk to the remote
    pub fn remote_url(&self) -> Result<&str> {
        self.remote_url
            .as_deref()
            .context("No remote URL configured (pass --remote or set it in the config file)")
    }

    pub fn open_storage(&self) -> Result<Arc<dyn StorageBackend>> {
        let storage = SledStorage::open(&self.store_path.join("outbox.db"))
            .context("Failed to open local store")?;
        Ok(Arc::new(storage))
    }

    pub fn gateway(&self) -> Result<Arc<HttpGateway>> {
        Ok(Arc::new(HttpGateway::new(self.remote_url()?)))
    }
}
