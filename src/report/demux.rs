use tracing::{debug, warn};

use super::plan::{PlannedBatch, PlannedReport};
use super::ResultSet;
use crate::errors::{ReportError, Result};
use crate::models::report_config::FieldKind;
use crate::models::response::{BatchRunReportsResponse, RunReportResponse, Value};
use crate::table::{finalize, ColumnSchema, ProvenanceSource, RawColumns};

/// What to do when the service returns a different number of reports than
/// were requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlignmentPolicy {
    /// Fail the whole call.
    #[default]
    Strict,
    /// Keep the reports that line up and drop the rest with a warning.
    Lenient,
}

/// Split a batch response into one finalized table per planned report.
///
/// The i-th returned report belongs to the i-th planned report.
pub fn demux<P: ProvenanceSource + ?Sized>(
    response: BatchRunReportsResponse,
    batch: &PlannedBatch,
    schema: &ColumnSchema,
    policy: AlignmentPolicy,
    provenance: &mut P,
) -> Result<ResultSet> {
    let requested = batch.len();
    let returned = response.reports.len();

    if requested != returned {
        match policy {
            AlignmentPolicy::Strict => {
                return Err(ReportError::ReportCountMismatch { requested, returned });
            }
            AlignmentPolicy::Lenient => {
                let dropped: Vec<&str> = batch.names().skip(returned).collect();
                warn!(requested, returned, ?dropped, "report count mismatch, keeping aligned prefix");
            }
        }
    }

    let mut tables = ResultSet::default();
    for (planned, report) in batch.reports().iter().zip(response.reports) {
        let raw = unpack(planned, &report)?;
        debug!(report = %planned.name, rows = raw.num_rows(), "unpacked report rows");
        tables.push(finalize(&planned.name, raw, schema, provenance)?);
    }
    Ok(tables)
}

/// Unpack every row of `report` into fresh column storage, dimensions first.
fn unpack(planned: &PlannedReport, report: &RunReportResponse) -> Result<RawColumns> {
    let dimensions: Vec<&str> = planned.request.dimension_names().collect();
    let metrics: Vec<&str> = planned.request.metric_names().collect();
    let offset = dimensions.len();

    let mut raw = RawColumns::new(dimensions.iter().chain(metrics.iter()).copied());

    for (idx, row) in report.rows.iter().enumerate() {
        let dims = row_values(planned, idx, FieldKind::Dimension, &row.dimension_values, dimensions.len())?;
        let mets = row_values(planned, idx, FieldKind::Metric, &row.metric_values, metrics.len())?;

        for (col, value) in dims.iter().enumerate() {
            raw.push(col, value.value.clone());
        }
        for (col, value) in mets.iter().enumerate() {
            raw.push(offset + col, value.value.clone());
        }
    }
    Ok(raw)
}

/// The first `expected` values of a row. Extra trailing values are ignored.
fn row_values<'a>(
    planned: &PlannedReport,
    row: usize,
    kind: FieldKind,
    values: &'a [Value],
    expected: usize,
) -> Result<&'a [Value]> {
    values.get(..expected).ok_or_else(|| ReportError::RowShape {
        report: planned.name.clone(),
        row,
        kind,
        expected,
        actual: values.len(),
    })
}
