use serde::{Deserialize, Serialize};

/// Target type of a column after finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Text,
    Integer,
    Float,
    /// Calendar date held as a midnight timestamp.
    Date,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Text => "text",
            SemanticType::Integer => "int64",
            SemanticType::Float => "float64",
            SemanticType::Date => "date",
        }
    }
}

/// Field name → semantic type. Fields without an entry stay text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    types: Vec<(String, SemanticType)>,
}

impl ColumnSchema {
    /// A schema that leaves every column as text.
    pub fn empty() -> Self {
        Self { types: Vec::new() }
    }

    /// The known GA4 metric types plus the `date` dimension.
    pub fn ga4_default() -> Self {
        Self::empty()
            .with_type("date", SemanticType::Date)
            .with_type("activeUsers", SemanticType::Integer)
            .with_type("active1DayUsers", SemanticType::Integer)
            .with_type("active7DayUsers", SemanticType::Integer)
            .with_type("active28DayUsers", SemanticType::Integer)
            .with_type("userEngagementDuration", SemanticType::Float)
            .with_type("engagedSessions", SemanticType::Integer)
            .with_type("sessions", SemanticType::Integer)
    }

    /// Set the type of `field`, replacing any earlier entry.
    pub fn with_type(mut self, field: impl Into<String>, ty: SemanticType) -> Self {
        let field = field.into();
        match self.types.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = ty,
            None => self.types.push((field, ty)),
        }
        self
    }

    pub fn type_of(&self, field: &str) -> SemanticType {
        self.types
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, ty)| *ty)
            .unwrap_or(SemanticType::Text)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, SemanticType)> {
        self.types.iter().map(|(name, ty)| (name.as_str(), *ty))
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self::ga4_default()
    }
}
