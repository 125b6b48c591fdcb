// src/fetch/auth.rs

use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::QueryError;

/// Tokens are refreshed this many seconds before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;
/// Longest a token is cached, whatever `expires_in` claims.
const MAX_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanges a refresh token for access tokens and caches them until expiry.
pub struct TokenSource {
    client: Client,
    token_uri: String,
    credentials: OAuthCredentials,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    pub fn new(client: Client, token_uri: impl Into<String>, credentials: OAuthCredentials) -> Self {
        Self {
            client,
            token_uri: token_uri.into(),
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, refreshing it first if needed.
    pub fn access_token(&self) -> Result<String, QueryError> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| QueryError::Auth("token cache poisoned".into()))?;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let token = self.refresh()?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    #[instrument(level = "debug", skip(self), fields(token_uri = %self.token_uri))]
    fn refresh(&self) -> Result<AccessToken, QueryError> {
        let refresh_token = self
            .credentials
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| QueryError::Auth("no OAuth refresh token configured".into()))?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(TokenErrorResponse {
                    error,
                    error_description: Some(description),
                }) => format!("{error}: {description}"),
                Ok(TokenErrorResponse { error, .. }) => error,
                Err(_) => format!("token endpoint returned {status}"),
            };
            return Err(QueryError::Auth(reason));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| QueryError::Auth(format!("unexpected token response: {e}")))?;
        debug!(expires_in = parsed.expires_in, "refreshed access token");
        Ok(AccessToken {
            value: parsed.access_token,
            expires_at: Utc::now() + cache_lifetime(parsed.expires_in),
        })
    }
}

/// How long a token with the given `expires_in` may be served from cache.
fn cache_lifetime(expires_in: i64) -> Duration {
    let secs = expires_in
        .saturating_sub(EXPIRY_MARGIN_SECS)
        .clamp(0, MAX_LIFETIME_SECS);
    Duration::try_seconds(secs).unwrap_or_else(Duration::zero)
}
