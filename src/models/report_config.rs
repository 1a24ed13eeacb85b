//! Named-report configuration.
//!
//! Each report name maps to a list of field-group records, one carrying the
//! ordered `dimension` names and one carrying the ordered `metric` names:
//!
//! ```yaml
//! signal_data:
//!   - dimension: [date, userGender, userAgeBracket]
//!   - metric: [activeUsers]
//! active_usr:
//!   - dimension: [date]
//!   - metric: [active1DayUsers, active7DayUsers, active28DayUsers]
//! ```
//!
//! Report order is the document order and is preserved; it drives request
//! order in the batch.

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ReportError, Result};

/// Which field list of a report to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Dimension,
    Metric,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Dimension => "dimension",
            FieldKind::Metric => "metric",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of a report's field-group list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Vec<String>>,
}

impl FieldGroup {
    pub fn dimensions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimension: Some(names.into_iter().map(Into::into).collect()),
            metric: None,
        }
    }

    pub fn metrics<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimension: None,
            metric: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    fn get(&self, kind: FieldKind) -> Option<&[String]> {
        match kind {
            FieldKind::Dimension => self.dimension.as_deref(),
            FieldKind::Metric => self.metric.as_deref(),
        }
    }
}

/// Ordered mapping of report name to its field groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportConfig {
    reports: Vec<(String, Vec<FieldGroup>)>,
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report with its dimension and metric lists. A name that is
    /// already present is replaced in place, keeping its position.
    pub fn with_report<D, M, S>(mut self, name: impl Into<String>, dimensions: D, metrics: M) -> Self
    where
        D: IntoIterator<Item = S>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let groups = vec![FieldGroup::dimensions(dimensions), FieldGroup::metrics(metrics)];
        self.insert(name.into(), groups);
        self
    }

    pub fn insert(&mut self, name: String, groups: Vec<FieldGroup>) {
        match self.reports.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = groups,
            None => self.reports.push((name, groups)),
        }
    }

    /// Load a configuration from a YAML or JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// Parse a configuration document. JSON is accepted as well since it is
    /// a subset of YAML.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Report names in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.reports.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reports.iter().any(|(n, _)| n == name)
    }

    /// Return the field list of `kind` for `report`.
    ///
    /// Scans the report's field groups and returns the first one carrying
    /// `kind`. Field names are not checked against the reporting service.
    pub fn resolve(&self, report: &str, kind: FieldKind) -> Result<&[String]> {
        let (_, groups) = self
            .reports
            .iter()
            .find(|(name, _)| name == report)
            .ok_or_else(|| ReportError::ReportNotFound(report.to_string()))?;

        groups
            .iter()
            .find_map(|group| group.get(kind))
            .ok_or_else(|| ReportError::MissingFieldKind {
                report: report.to_string(),
                kind,
            })
    }
}

/// Free-function form of [`ReportConfig::resolve`].
pub fn resolve<'a>(config: &'a ReportConfig, report: &str, kind: FieldKind) -> Result<&'a [String]> {
    config.resolve(report, kind)
}

impl Serialize for ReportConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.reports.len()))?;
        for (name, groups) in &self.reports {
            map.serialize_entry(name, groups)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ReportConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ConfigVisitor;

        impl<'de> Visitor<'de> for ConfigVisitor {
            type Value = ReportConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of report name to field groups")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut config = ReportConfig::new();
                while let Some((name, groups)) = access.next_entry::<String, Vec<FieldGroup>>()? {
                    if config.contains(&name) {
                        return Err(serde::de::Error::custom(format!("duplicate report name '{}'", name)));
                    }
                    config.reports.push((name, groups));
                }
                Ok(config)
            }
        }

        deserializer.deserialize_map(ConfigVisitor)
    }
}
