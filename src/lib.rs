//! ga4-reports — batch GA4 Data API reports into typed tables.
//!
//! A [`ReportConfig`](models::report_config::ReportConfig) names each report
//! and its dimension and metric fields. [`BatchReportBuilder`](report::BatchReportBuilder)
//! sends all of them in one `batchRunReports` call through a
//! [`ReportingClient`](client::ReportingClient) and returns one
//! [`ReportTable`](table::ReportTable) per report, with typed columns and
//! `uuid` / `emitted_at` provenance columns.

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod report;
pub mod table;
