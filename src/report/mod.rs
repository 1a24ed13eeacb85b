//! Batch report orchestration: plan one request per configured report, send
//! them in a single call and turn the answer into typed tables.

pub mod demux;
pub mod plan;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub use demux::{demux, AlignmentPolicy};
pub use plan::{build_batch, build_request, PlannedBatch, PlannedReport};

use crate::client::ReportingClient;
use crate::errors::Result;
use crate::models::report_config::ReportConfig;
use crate::models::request::DateRange;
use crate::models::response::BatchRunReportsResponse;
use crate::table::{ColumnSchema, ProvenanceSource, ReportTable, SystemProvenance};

/// Finalized tables keyed by report name, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    tables: Vec<ReportTable>,
}

impl ResultSet {
    pub(crate) fn push(&mut self, table: ReportTable) {
        self.tables.push(table);
    }

    pub fn get(&self, name: &str) -> Option<&ReportTable> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(ReportTable::name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ReportTable;
    type IntoIter = std::vec::IntoIter<ReportTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ReportTable;
    type IntoIter = std::slice::Iter<'a, ReportTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

/// Serializes as `{report_name: [row, ...], ...}` in configuration order.
impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(table.name(), table)?;
        }
        map.end()
    }
}

/// Runs a configured set of reports against one property.
#[derive(Debug, Clone, Default)]
pub struct BatchReportBuilder {
    date_range: DateRange,
    schema: ColumnSchema,
    alignment: AlignmentPolicy,
}

impl BatchReportBuilder {
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            ..Default::default()
        }
    }

    pub fn with_schema(mut self, schema: ColumnSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentPolicy) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn plan(&self, config: &ReportConfig, property_id: &str) -> Result<PlannedBatch> {
        build_batch(config, property_id, &self.date_range)
    }

    /// Plan the batch and send it. Nothing is sent if planning fails.
    pub async fn run<C: ReportingClient + ?Sized>(
        &self,
        client: &C,
        property_id: &str,
        config: &ReportConfig,
    ) -> Result<(PlannedBatch, BatchRunReportsResponse)> {
        let batch = self.plan(config, property_id)?;
        tracing::info!(
            property = batch.property(),
            reports = batch.len(),
            start_date = %self.date_range.start_date,
            end_date = %self.date_range.end_date,
            "running batch report"
        );
        let response = client.batch_run_reports(&batch.to_request()).await?;
        Ok((batch, response))
    }

    pub fn demux<P: ProvenanceSource + ?Sized>(
        &self,
        response: BatchRunReportsResponse,
        batch: &PlannedBatch,
        provenance: &mut P,
    ) -> Result<ResultSet> {
        demux(response, batch, &self.schema, self.alignment, provenance)
    }

    /// Fetch every configured report and return one table per report name.
    pub async fn generate_batch_report<C: ReportingClient + ?Sized>(
        &self,
        client: &C,
        property_id: &str,
        config: &ReportConfig,
    ) -> Result<ResultSet> {
        self.generate_batch_report_with(client, property_id, config, &mut SystemProvenance)
            .await
    }

    /// As [`generate_batch_report`](Self::generate_batch_report) with an
    /// explicit source for the `uuid` and `emitted_at` columns.
    pub async fn generate_batch_report_with<C, P>(
        &self,
        client: &C,
        property_id: &str,
        config: &ReportConfig,
        provenance: &mut P,
    ) -> Result<ResultSet>
    where
        C: ReportingClient + ?Sized,
        P: ProvenanceSource + Send + ?Sized,
    {
        let (batch, response) = self.run(client, property_id, config).await?;
        let tables = self.demux(response, &batch, provenance)?;
        tracing::info!(
            property = batch.property(),
            tables = tables.len(),
            rows = tables.iter().map(ReportTable::num_rows).sum::<usize>(),
            "batch report complete"
        );
        Ok(tables)
    }
}
