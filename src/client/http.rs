//! HTTP client for the GA4 Data API.
//! One POST per batch; failures are returned as-is, never retried.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{Credentials, ReportingClient};
use crate::errors::{ReportError, Result};
use crate::models::request::BatchRunReportsRequest;
use crate::models::response::BatchRunReportsResponse;

pub const DEFAULT_BASE_URL: &str = "https://analyticsdata.googleapis.com";

pub struct DataApiClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl DataApiClient {
    /// Build a client around an already obtained bearer token.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Resolve `credentials` to a bearer token and build a client with it.
    pub async fn connect(base_url: impl Into<String>, credentials: &Credentials, timeout: Duration) -> Result<Self> {
        let http = http_client(timeout)?;
        let access_token = credentials.access_token(&http).await?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn batch_url(&self, property: &str) -> String {
        format!("{}/v1beta/{}:batchRunReports", self.base_url, property)
    }
}

fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("ga4-reports/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

#[async_trait]
impl ReportingClient for DataApiClient {
    #[tracing::instrument(skip(self, request), fields(property = %request.property, reports = request.requests.len()))]
    async fn batch_run_reports(&self, request: &BatchRunReportsRequest) -> Result<BatchRunReportsResponse> {
        let resp = self
            .http
            .post(self.batch_url(&request.property))
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Data API request failed: {}", e);
                ReportError::Transport(e)
            })?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            tracing::warn!(status = %status, "Data API returned an error");
            return Err(ReportError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: BatchRunReportsResponse = serde_json::from_str(&body)?;
        tracing::debug!(reports = parsed.reports.len(), "Data API response received");
        Ok(parsed)
    }
}
