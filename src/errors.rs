use thiserror::Error;

use crate::models::report_config::FieldKind;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report '{0}' not found in configuration")]
    ReportNotFound(String),

    #[error("report '{report}' has no {kind} field group")]
    MissingFieldKind { report: String, kind: FieldKind },

    #[error("failed to read report configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse report configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("reporting service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("submitted {requested} report requests but the service returned {returned} reports")]
    ReportCountMismatch { requested: usize, returned: usize },

    #[error("report '{report}' row {row}: expected {expected} {kind} values, got {actual}")]
    RowShape {
        report: String,
        row: usize,
        kind: FieldKind,
        expected: usize,
        actual: usize,
    },

    #[error("column '{column}' row {row}: cannot convert '{value}' to {target}")]
    Coercion {
        column: String,
        row: usize,
        value: String,
        target: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;
