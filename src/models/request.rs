//! Request types for the GA4 Data API `batchRunReports` call.
//!
//! Field names follow the service's JSON mapping (camelCase).

use serde::{Deserialize, Serialize};

/// Service-side row cap applied to every report request. Rows beyond it are
/// dropped by the service without notice.
pub const ROW_LIMIT: i64 = 100_000;

pub const DEFAULT_START_DATE: &str = "2024-04-01";
pub const DEFAULT_END_DATE: &str = "2024-04-30";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

impl DateRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    /// Build a range from optional bounds, falling back to the default month
    /// for whichever side is unset.
    pub fn or_default(start_date: Option<String>, end_date: Option<String>) -> Self {
        Self {
            start_date: start_date.unwrap_or_else(|| DEFAULT_START_DATE.to_string()),
            end_date: end_date.unwrap_or_else(|| DEFAULT_END_DATE.to_string()),
        }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new(DEFAULT_START_DATE, DEFAULT_END_DATE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    pub date_ranges: Vec<DateRange>,
    pub limit: i64,
}

impl RunReportRequest {
    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|d| d.name.as_str())
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.name.as_str())
    }
}

/// Body of a `batchRunReports` call. The property travels in the URL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRunReportsRequest {
    #[serde(skip)]
    pub property: String,
    pub requests: Vec<RunReportRequest>,
}

/// Resource name of a property, e.g. `properties/123456`.
pub fn property_name(property_id: &str) -> String {
    format!("properties/{}", property_id)
}
