//! Error types shared by the materializer and the query service.

use std::fmt;

use thiserror::Error;

/// One response row could not be turned into a value tree.
///
/// Always carries the raw wire text of the offending row so the caller can
/// log it; the materializer counts these and keeps going.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Row text is not valid JSON
    #[error("row is not valid JSON: {source}")]
    Malformed {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// Row is valid JSON but not an object keyed by table name
    #[error("row is not an object")]
    NotAnObject { raw: String },

    /// A top-level entry is a scalar or list instead of a field mapping
    #[error("entry `{table}` is not an object")]
    NotATable { table: String, raw: String },
}

impl DecodeError {
    /// Raw wire representation of the row that failed.
    pub fn raw(&self) -> &str {
        match self {
            DecodeError::Malformed { raw, .. }
            | DecodeError::NotAnObject { raw }
            | DecodeError::NotATable { raw, .. } => raw,
        }
    }
}

/// The query service failed; the whole query is aborted.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Access token could not be obtained
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network or HTTP client failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with an error status
    #[error("{0}")]
    Api(ApiFailure),

    /// The API answered 2xx but the body was not the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl QueryError {
    /// Multi-line, user-facing description of the failure.
    pub fn report(&self) -> String {
        match self {
            QueryError::Api(failure) => failure.report(),
            other => other.to_string(),
        }
    }
}

/// A single entry of a Google Ads failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorDetail {
    /// Error code rendered as `category: CODE`, e.g. `queryError: UNRECOGNIZED_FIELD`
    pub code: Option<String>,
    pub message: String,
    /// Field names from the error location, outermost first
    pub field_path: Vec<String>,
}

/// Decoded error body of a non-2xx API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub http_status: u16,
    /// Canonical status name, e.g. `INVALID_ARGUMENT`
    pub status: String,
    pub message: String,
    pub request_id: Option<String>,
    pub errors: Vec<ApiErrorDetail>,
}

impl ApiFailure {
    pub fn report(&self) -> String {
        let mut out = format!(
            "Request with ID \"{}\" failed with status \"{}\" and includes the following errors:",
            self.request_id.as_deref().unwrap_or("unknown"),
            self.status
        );
        if self.errors.is_empty() {
            out.push_str(&format!("\n\tError with message \"{}\".", self.message));
        }
        for error in &self.errors {
            out.push_str(&format!("\n\tError with message \"{}\".", error.message));
            if let Some(code) = &error.code {
                out.push_str(&format!("\n\t\tError code: {code}"));
            }
            for field in &error.field_path {
                out.push_str(&format!("\n\t\tOn field: {field}"));
            }
        }
        out
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.http_status, self.message)?;
        if let Some(id) = &self.request_id {
            write!(f, " [request id {id}]")?;
        }
        Ok(())
    }
}
