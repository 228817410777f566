use std::fmt;
use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

pub const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
// Refresh a little before Google considers the token expired.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse credentials: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid service account key: {0}")]
    InvalidKey(String),
    #[error("Token request failed: {0}")]
    TokenRequest(#[from] reqwest::Error),
    #[error("Token endpoint returned {0}")]
    TokenStatus(reqwest::StatusCode),
}

/// Service-account key as downloaded from the Google Cloud console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub enum VisionCredentials {
    ApiKey(String),
    ServiceAccount(ServiceAccountKey),
}

impl fmt::Debug for VisionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisionCredentials::ApiKey(_) => write!(f, "ApiKey(..)"),
            VisionCredentials::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
        }
    }
}

impl VisionCredentials {
    pub fn from_json(raw: &str) -> Result<Self, CredentialsError> {
        let key: ServiceAccountKey = serde_json::from_str(raw)?;
        if key.client_email.trim().is_empty() {
            return Err(CredentialsError::InvalidKey("client_email is empty".to_string()));
        }
        // Fail early rather than on the first request.
        EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CredentialsError::InvalidKey(e.to_string()))?;
        Ok(VisionCredentials::ServiceAccount(key))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CredentialsError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Exchanges a service-account key for short-lived OAuth2 access tokens.
pub struct TokenSource {
    key: ServiceAccountKey,
    client: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey, client: reqwest::Client) -> Self {
        Self {
            key,
            client,
            cached: RwLock::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, CredentialsError> {
        let now = Utc::now().timestamp();

        if let Some(token) = self.cached.read().await.as_ref() {
            if token.expires_at - TOKEN_REFRESH_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref() {
            if token.expires_at - TOKEN_REFRESH_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_token(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn signed_assertion(&self, now: i64) -> Result<String, CredentialsError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: VISION_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| CredentialsError::InvalidKey(e.to_string()))?;
        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| CredentialsError::InvalidKey(e.to_string()))
    }

    async fn fetch_token(&self, now: i64) -> Result<CachedToken, CredentialsError> {
        let assertion = self.signed_assertion(now)?;
        tracing::debug!("Requesting access token for {}", self.key.client_email);

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CredentialsError::TokenStatus(response.status()));
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS),
        })
    }
}
