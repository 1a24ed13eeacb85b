//! Bearer credentials for the Data API.
//!
//! A service-account key file is exchanged once for an access token through
//! the OAuth 2.0 JWT bearer grant; a pre-minted token can be used directly.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::errors::{ReportError, Result};

pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a service-account key file this crate needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// Keep the private key out of logs.
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Credentials(format!("cannot read key file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ReportError::Credentials(format!("invalid key file {}: {}", path.display(), e))
        })
    }

    /// Signed RS256 assertion for the token exchange.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let claims = Claims {
            iss: self.client_email.clone(),
            scope: ANALYTICS_READONLY_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&header, &claims, &key)?)
    }

    /// Exchange a fresh assertion for an access token.
    pub async fn fetch_access_token(&self, http: &reqwest::Client) -> Result<String> {
        let assertion = self.assertion(Utc::now())?;
        let resp = http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, client_email = %self.client_email, "token exchange failed");
            return Err(ReportError::Credentials(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = resp.json().await?;
        tracing::debug!(client_email = %self.client_email, "obtained access token");
        Ok(token.access_token)
    }
}

/// Where the client's bearer token comes from.
#[derive(Clone)]
pub enum Credentials {
    AccessToken(String),
    ServiceAccount(ServiceAccountKey),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.write_str("AccessToken(..)"),
            Credentials::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
        }
    }
}

impl Credentials {
    pub fn service_account_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Credentials::ServiceAccount(ServiceAccountKey::from_path(path)?))
    }

    pub async fn access_token(&self, http: &reqwest::Client) -> Result<String> {
        match self {
            Credentials::AccessToken(token) => Ok(token.clone()),
            Credentials::ServiceAccount(key) => key.fetch_access_token(http).await,
        }
    }
}
