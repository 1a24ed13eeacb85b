pub mod credentials;
pub mod http;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::request::BatchRunReportsRequest;
use crate::models::response::BatchRunReportsResponse;

pub use credentials::{Credentials, ServiceAccountKey};
pub use http::DataApiClient;

/// Anything that can answer a `batchRunReports` call.
///
/// Reports must come back in request order; the batch builder relies on it.
#[async_trait]
pub trait ReportingClient: Send + Sync {
    async fn batch_run_reports(&self, request: &BatchRunReportsRequest) -> Result<BatchRunReportsResponse>;
}
