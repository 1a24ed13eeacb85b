//! Typed, column-oriented report tables.

pub mod finalize;
pub mod provenance;
pub mod schema;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

pub use finalize::finalize;
pub use provenance::{FixedProvenance, ProvenanceSource, SystemProvenance};
pub use schema::{ColumnSchema, SemanticType};

pub const UUID_COLUMN: &str = "uuid";
pub const EMITTED_AT_COLUMN: &str = "emitted_at";

/// Raw string cells of one report, keyed by field name in request order.
///
/// Built fresh for every report and consumed by [`finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumns {
    columns: Vec<(String, Vec<String>)>,
}

impl RawColumns {
    pub fn new<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            columns: fields
                .into_iter()
                .map(|name| (name.to_string(), Vec::new()))
                .collect(),
        }
    }

    /// Append a cell to the column at `index`.
    pub fn push(&mut self, index: usize, value: String) {
        self.columns[index].1.push(value);
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|(_, cells)| cells.len()).unwrap_or(0)
    }

    pub fn into_columns(self) -> Vec<(String, Vec<String>)> {
        self.columns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<String>),
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Date(Vec<NaiveDateTime>),
    Timestamp(Vec<DateTime<Utc>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Date(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            ColumnData::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&[i64]> {
        match self {
            ColumnData::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            ColumnData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&[NaiveDateTime]> {
        match self {
            ColumnData::Date(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&[DateTime<Utc>]> {
        match self {
            ColumnData::Timestamp(v) => Some(v),
            _ => None,
        }
    }

}

/// One cell of a column, serialized by the column's type.
struct Cell<'a>(&'a ColumnData, usize);

impl Serialize for Cell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Cell(data, row) = *self;
        match data {
            ColumnData::Text(v) => serializer.serialize_str(&v[row]),
            ColumnData::Integer(v) => serializer.serialize_i64(v[row]),
            ColumnData::Float(v) => serializer.serialize_f64(v[row]),
            ColumnData::Date(v) => serializer.collect_str(&v[row].format("%Y-%m-%dT%H:%M:%S")),
            ColumnData::Timestamp(v) => serializer.serialize_str(&v[row].to_rfc3339()),
        }
    }
}

struct Record<'a>(&'a [Column], usize);

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Record(columns, row) = *self;
        let mut map = serializer.serialize_map(Some(columns.len()))?;
        for column in columns {
            map.serialize_entry(&column.name, &Cell(&column.data, row))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Finalized table for one report name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    name: String,
    columns: Vec<Column>,
    num_rows: usize,
}

impl ReportTable {
    pub(crate) fn new(name: String, columns: Vec<Column>, num_rows: usize) -> Self {
        Self {
            name,
            columns,
            num_rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    /// Shared build timestamp, `None` for a table without rows.
    pub fn emitted_at(&self) -> Option<DateTime<Utc>> {
        self.column(EMITTED_AT_COLUMN)
            .and_then(ColumnData::as_timestamp)
            .and_then(|v| v.first().copied())
    }
}

/// Serializes as a list of row records, keys in column order.
impl Serialize for ReportTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.num_rows))?;
        for row in 0..self.num_rows {
            seq.serialize_element(&Record(&self.columns, row))?;
        }
        seq.end()
    }
}
