//! Periodic reachability probe
//!
//! Hosts with a platform connectivity signal feed the monitor's watch channel
//! themselves. For hosts without one (headless daemons, CLIs) the prober
//! polls the remote health endpoint and publishes the result.

use reqwest::StatusCode;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

/// Publishes remote reachability into a watch channel
pub struct Prober {
    client: reqwest::Client,
    health_url: String,
    period: Duration,
    tx: watch::Sender<bool>,
}

impl Prober {
    /// Create a prober against `<base_url>/health`
    ///
    /// The returned receiver starts offline; the first probe corrects it.
    pub fn new(base_url: &str, period: Duration) -> (Self, watch::Receiver<bool>) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let (tx, rx) = watch::channel(false);
        let prober = Self {
            client,
            health_url: format!("{}/health", base_url.trim_end_matches('/')),
            period,
            tx,
        };
        (prober, rx)
    }

    /// Spawn the probe loop as an owned background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Probe until every receiver is gone
    pub async fn run(self) {
        let mut timer = interval(self.period);

        loop {
            timer.tick().await;

            let online = self.check().await;
            if *self.tx.borrow() != online {
                info!(
                    "Remote {} is now {}",
                    self.health_url,
                    if online { "reachable" } else { "unreachable" }
                );
            }

            if self.tx.send(online).is_err() {
                debug!("No reachability listeners left, prober stopping");
                break;
            }
        }
    }

    async fn check(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success() || response.status() == StatusCode::NOT_FOUND,
            Err(_) => false,
        }
    }
}
