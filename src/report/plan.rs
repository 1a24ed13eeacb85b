use crate::errors::Result;
use crate::models::report_config::{FieldKind, ReportConfig};
use crate::models::request::{
    property_name, BatchRunReportsRequest, DateRange, Dimension, Metric, RunReportRequest, ROW_LIMIT,
};

/// A report request tagged with the report name it was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedReport {
    pub name: String,
    pub request: RunReportRequest,
}

/// Ordered `(name, request)` pairs for one batch call.
///
/// The service answers positionally, so this pairing is the only link between
/// a returned report and its name.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBatch {
    property: String,
    reports: Vec<PlannedReport>,
}

impl PlannedBatch {
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn reports(&self) -> &[PlannedReport] {
        &self.reports
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.reports.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// The wire request, requests in planning order.
    pub fn to_request(&self) -> BatchRunReportsRequest {
        BatchRunReportsRequest {
            property: self.property.clone(),
            requests: self.reports.iter().map(|r| r.request.clone()).collect(),
        }
    }
}

pub fn build_request<D, M>(dimensions: D, metrics: M, date_range: &DateRange) -> RunReportRequest
where
    D: IntoIterator,
    D::Item: Into<String>,
    M: IntoIterator,
    M::Item: Into<String>,
{
    RunReportRequest {
        dimensions: dimensions
            .into_iter()
            .map(|name| Dimension { name: name.into() })
            .collect(),
        metrics: metrics
            .into_iter()
            .map(|name| Metric { name: name.into() })
            .collect(),
        date_ranges: vec![date_range.clone()],
        limit: ROW_LIMIT,
    }
}

/// Plan one request per report, in configuration order.
///
/// Every report is resolved up front, so a configuration-shape error is
/// returned before anything is sent.
pub fn build_batch(config: &ReportConfig, property_id: &str, date_range: &DateRange) -> Result<PlannedBatch> {
    let reports = config
        .names()
        .map(|name| {
            let dimensions = config.resolve(name, FieldKind::Dimension)?;
            let metrics = config.resolve(name, FieldKind::Metric)?;
            Ok(PlannedReport {
                name: name.to_string(),
                request: build_request(dimensions.iter().cloned(), metrics.iter().cloned(), date_range),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PlannedBatch {
        property: property_name(property_id),
        reports,
    })
}
