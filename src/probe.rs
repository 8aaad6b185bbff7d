// Probe client: one remote health check returning an untyped payload.
// Timeouts are enforced here; retries are not (the store re-probes on schedule).

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

use crate::models::RawPayload;
use crate::version;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("health probe request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("health probe returned HTTP {0}")]
    Status(u16),
    #[error("health probe response is not valid JSON: {0}")]
    Decode(String),
}

/// Source of raw health payloads. Implementations must be cheap to call
/// concurrently: a manual refresh may overlap a scheduled cycle.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check_health(&self) -> Result<RawPayload, ProbeError>;
}

/// `GET <url>` against the gateway's health endpoint.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(version::user_agent())
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    #[instrument(skip(self), fields(probe = "http", url = %self.url))]
    async fn check_health(&self) -> Result<RawPayload, ProbeError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ProbeError::Decode(e.to_string()))
    }
}
