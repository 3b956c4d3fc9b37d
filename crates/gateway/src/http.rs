//! Reqwest-backed remote gateway

use async_trait::async_trait;
use outbox_core::{GatewayError, ProgressSnapshot, RemoteGateway, Target, Verb};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Wire shape of a progress snapshot, without the owner (it lives in the URL)
#[derive(Serialize, Deserialize)]
struct SnapshotBody {
    step: u64,
    data: Value,
}

/// HTTP client for the authoritative remote store
///
/// Performs no retries of its own; retry policy belongs to the dispatcher
/// and reconciler. Any request timeout is the transport's, set here at 5s.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn progress_url(&self, owner_id: &str) -> String {
        format!("{}/owners/{}/progress", self.base_url, owner_id)
    }

    /// Map a non-success status onto the error taxonomy: 5xx is transient,
    /// everything else is a permanent rejection
    fn classify(status: StatusCode) -> GatewayError {
        if status.is_server_error() {
            GatewayError::Server(status.as_u16())
        } else {
            GatewayError::Rejected(status.as_u16())
        }
    }
}

fn method_for(verb: Verb) -> reqwest::Method {
    match verb {
        Verb::Post => reqwest::Method::POST,
        Verb::Put => reqwest::Method::PUT,
        Verb::Patch => reqwest::Method::PATCH,
        Verb::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn read(&self, owner_id: &str) -> Result<Option<ProgressSnapshot>, GatewayError> {
        let response = self
            .client
            .get(self.progress_url(owner_id))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::classify(response.status()));
        }

        let body: SnapshotBody = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Some(ProgressSnapshot::new(owner_id, body.step, body.data)))
    }

    async fn upsert(&self, owner_id: &str, step: u64, data: &Value) -> Result<(), GatewayError> {
        let body = SnapshotBody {
            step,
            data: data.clone(),
        };

        let response = self
            .client
            .put(self.progress_url(owner_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::classify(response.status()));
        }

        debug!("Upserted step {} for {}", step, owner_id);
        Ok(())
    }

    async fn deliver(&self, target: &Target, payload: &Value) -> Result<(), GatewayError> {
        let url = format!("{}{}", self.base_url, target.resource);

        let response = self
            .client
            .request(method_for(target.verb), &url)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::classify(response.status()));
        }

        debug!("Delivered {} {}", target.verb, target.resource);
        Ok(())
    }
}
