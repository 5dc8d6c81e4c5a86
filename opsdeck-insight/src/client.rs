//! HTTP client for the text-generation collaborator.

use crate::error::{InsightError, InsightResult};
use crate::metrics::DashboardMetrics;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Configuration for the summary service.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Endpoint accepting a metrics POST and answering with a summary.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3400/summarize".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Request body sent to the service.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest {
    #[serde(flatten)]
    pub metrics: DashboardMetrics,
}

/// Response body received from the service.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    /// A concise natural-language summary of the metrics.
    pub summary: String,
}

/// Client for the summary service.
///
/// One request in, one summary out. Failures are returned, never retried.
pub struct SummaryClient {
    config: SummaryConfig,
    http: reqwest::Client,
}

impl SummaryClient {
    /// Builds a client for the configured endpoint.
    pub fn new(config: SummaryConfig) -> InsightResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    /// Asks the service to summarize the given metrics.
    ///
    /// Validates before any network call: malformed metrics never leave
    /// the process.
    pub async fn summarize(&self, metrics: DashboardMetrics) -> InsightResult<String> {
        metrics.validate()?;

        debug!(endpoint = %self.config.endpoint, ?metrics, "requesting summary");
        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&SummaryRequest { metrics })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsightError::Status {
                status: status.as_u16(),
            });
        }

        let body: SummaryResponse = response.json().await?;
        if body.summary.trim().is_empty() {
            return Err(InsightError::EmptySummary);
        }
        Ok(body.summary)
    }
}
