use chrono::{NaiveDate, NaiveDateTime};

use super::{
    Column, ColumnData, ColumnSchema, ProvenanceSource, RawColumns, ReportTable, SemanticType,
    EMITTED_AT_COLUMN, UUID_COLUMN,
};
use crate::errors::{ReportError, Result};

/// Date layouts accepted for `date` columns. The service sends `YYYYMMDD`.
const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d"];

/// Coerce raw columns through `schema` and append the `uuid` and
/// `emitted_at` provenance columns.
///
/// The timestamp is read once, so every row of the table shares it. Any cell
/// that fails to convert aborts the whole table.
pub fn finalize<P: ProvenanceSource + ?Sized>(
    name: &str,
    raw: RawColumns,
    schema: &ColumnSchema,
    provenance: &mut P,
) -> Result<ReportTable> {
    let num_rows = raw.num_rows();
    let emitted_at = provenance.now();

    let mut columns = raw
        .into_columns()
        .into_iter()
        .map(|(field, cells)| {
            let data = coerce(&field, cells, schema.type_of(&field))?;
            Ok(Column { name: field, data })
        })
        .collect::<Result<Vec<_>>>()?;

    let ids = (0..num_rows).map(|_| provenance.row_id()).collect();
    columns.push(Column {
        name: UUID_COLUMN.to_string(),
        data: ColumnData::Text(ids),
    });
    columns.push(Column {
        name: EMITTED_AT_COLUMN.to_string(),
        data: ColumnData::Timestamp(vec![emitted_at; num_rows]),
    });

    tracing::debug!(report = name, rows = num_rows, columns = columns.len(), "finalized report table");
    Ok(ReportTable::new(name.to_string(), columns, num_rows))
}

fn coerce(field: &str, cells: Vec<String>, ty: SemanticType) -> Result<ColumnData> {
    let data = match ty {
        SemanticType::Text => ColumnData::Text(cells),
        SemanticType::Integer => ColumnData::Integer(convert(field, &cells, ty, |v| v.parse().ok())?),
        SemanticType::Float => ColumnData::Float(convert(field, &cells, ty, |v| v.parse().ok())?),
        SemanticType::Date => ColumnData::Date(convert(field, &cells, ty, parse_date)?),
    };
    Ok(data)
}

fn convert<T>(
    field: &str,
    cells: &[String],
    ty: SemanticType,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>> {
    cells
        .iter()
        .enumerate()
        .map(|(row, value)| {
            parse(value).ok_or_else(|| ReportError::Coercion {
                column: field.to_string(),
                row,
                value: value.clone(),
                target: ty.as_str(),
            })
        })
        .collect()
}

/// Parse a calendar date and pin it to midnight.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
