//! HTTP access to upstream rate APIs.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::UpstreamCause;

/// Configuration for outbound upstream calls.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Per-request timeout, covering connect through body read.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("dashrates/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Shared HTTP client for upstream providers and the failure webhook.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Build a client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }

    /// Wrap an existing client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// GET `url` and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamCause> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "Upstream responded");

        if !status.is_success() {
            return Err(UpstreamCause::Status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamCause::Payload(e.to_string()))
    }
}
