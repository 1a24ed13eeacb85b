//! Response types for the GA4 Data API `batchRunReports` call.
//!
//! Every cell arrives as a string regardless of its semantic type. The
//! service omits empty collections, so everything defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRunReportsResponse {
    #[serde(default)]
    pub reports: Vec<RunReportResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<Header>,
    #[serde(default)]
    pub metric_headers: Vec<Header>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub dimension_values: Vec<Value>,
    #[serde(default)]
    pub metric_values: Vec<Value>,
}

impl Row {
    pub fn new<D, M, S>(dimensions: D, metrics: M) -> Self
    where
        D: IntoIterator<Item = S>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimension_values: dimensions.into_iter().map(Value::new).collect(),
            metric_values: metrics.into_iter().map(Value::new).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Value {
    #[serde(default)]
    pub value: String,
}

impl Value {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}
