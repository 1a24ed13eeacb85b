use std::path::PathBuf;
use std::time::Duration;

use crate::client::http::DEFAULT_BASE_URL;
use crate::models::request::DateRange;
use crate::report::AlignmentPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub property_id: Option<String>,
    /// Path to a service-account key file.
    /// Set via GOOGLE_APPLICATION_CREDENTIALS.
    pub credentials_path: Option<PathBuf>,
    /// Pre-minted bearer token; takes precedence over the key file.
    /// Set via GA4_ACCESS_TOKEN.
    pub access_token: Option<String>,
    pub api_base_url: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Total HTTP timeout. Set via GA4_HTTP_TIMEOUT_SECS. Default: 60.
    pub http_timeout: Duration,
    /// Keep the aligned prefix instead of failing when the service returns
    /// fewer reports than requested. Set via GA4_ALLOW_PARTIAL.
    pub allow_partial: bool,
}

impl Config {
    pub fn date_range(&self) -> DateRange {
        DateRange::or_default(self.start_date.clone(), self.end_date.clone())
    }

    pub fn alignment(&self) -> AlignmentPolicy {
        if self.allow_partial {
            AlignmentPolicy::Lenient
        } else {
            AlignmentPolicy::Strict
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            property_id: None,
            credentials_path: None,
            access_token: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            start_date: None,
            end_date: None,
            http_timeout: Duration::from_secs(60),
            allow_partial: false,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    Ok(from_lookup(|key| std::env::var(key).ok()))
}

fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Config {
    let non_empty = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let defaults = Config::default();

    Config {
        property_id: non_empty("GA4_PROPERTY_ID"),
        credentials_path: non_empty("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
        access_token: non_empty("GA4_ACCESS_TOKEN"),
        api_base_url: non_empty("GA4_API_BASE_URL").unwrap_or(defaults.api_base_url),
        start_date: non_empty("GA4_START_DATE"),
        end_date: non_empty("GA4_END_DATE"),
        http_timeout: non_empty("GA4_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout),
        allow_partial: non_empty("GA4_ALLOW_PARTIAL")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false),
    }
}
