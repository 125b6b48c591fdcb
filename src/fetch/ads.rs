// src/fetch/ads.rs

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use serde_json::value::RawValue;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

use super::auth::{OAuthCredentials, TokenSource};
use super::{BatchStream, QueryService};
use crate::error::{ApiErrorDetail, ApiFailure, QueryError};
use crate::process::{RawRow, ResponseBatch};

/// How results are requested from the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// `googleAds:searchStream`: one response carrying every batch.
    #[default]
    Stream,
    /// `googleAds:search`: one request per page, issued as the stream is polled.
    Paged,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub endpoint: String,
    pub api_version: String,
    pub token_uri: String,
    pub developer_token: String,
    pub login_customer_id: Option<String>,
    pub credentials: OAuthCredentials,
    pub mode: SearchMode,
    pub timeout: Duration,
}

/// Google Ads REST client for GAQL searches.
pub struct GoogleAdsService {
    client: Client,
    base: String,
    settings: ServiceSettings,
    tokens: TokenSource,
}

impl GoogleAdsService {
    pub fn new(settings: ServiceSettings) -> Result<Self> {
        let base = format!(
            "{}/{}",
            settings.endpoint.trim_end_matches('/'),
            settings.api_version
        );
        Url::parse(&base).with_context(|| format!("invalid API endpoint `{}`", base))?;

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("adsctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        let tokens = TokenSource::new(
            client.clone(),
            settings.token_uri.clone(),
            settings.credentials.clone(),
        );

        Ok(Self {
            client,
            base,
            settings,
            tokens,
        })
    }

    fn method_url(&self, customer_id: &str, method: &str) -> String {
        format!("{}/customers/{}/googleAds:{}", self.base, customer_id, method)
    }

    #[instrument(level = "debug", skip(self, body))]
    fn post(&self, url: &str, body: &serde_json::Value) -> Result<Response, QueryError> {
        let token = self.tokens.access_token()?;
        let mut request = self
            .client
            .post(url)
            .bearer_auth(token)
            .header("developer-token", self.settings.developer_token.as_str())
            .json(body);
        if let Some(login) = &self.settings.login_customer_id {
            request = request.header("login-customer-id", login.as_str());
        }

        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let header_request_id = response
            .headers()
            .get("request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text()?;
        let mut failure = parse_failure(status.as_u16(), &text);
        if failure.request_id.is_none() {
            failure.request_id = header_request_id;
        }
        debug!(status = status.as_u16(), failure = %failure, "API returned an error");
        Err(QueryError::Api(failure))
    }
}

impl QueryService for GoogleAdsService {
    fn search<'a>(
        &'a self,
        customer_id: &str,
        query: &str,
    ) -> Result<BatchStream<'a>, QueryError> {
        debug!(customer_id, mode = ?self.settings.mode, "running query");
        match self.settings.mode {
            SearchMode::Stream => {
                let url = self.method_url(customer_id, "searchStream");
                let response = self.post(&url, &json!({ "query": query }))?;
                let http_status = response.status().as_u16();
                let text = response.text()?;
                let elements: Vec<Box<RawValue>> = serde_json::from_str(&text)?;
                info!(elements = elements.len(), "searchStream response received");
                let items: Vec<Result<ResponseBatch, QueryError>> = elements
                    .iter()
                    .map(|element| stream_element(http_status, element))
                    .collect();
                Ok(Box::new(items.into_iter()))
            }
            SearchMode::Paged => Ok(Box::new(PagedSearch {
                service: self,
                url: self.method_url(customer_id, "search"),
                query: query.to_string(),
                page_token: None,
                done: false,
            })),
        }
    }
}

/// Only used to spot the error element a failing stream ends with.
#[derive(Deserialize)]
struct StreamElement<'a> {
    #[serde(borrow, default)]
    error: Option<&'a RawValue>,
}

/// One element of a `searchStream` array: a batch, or the failure that cut
/// the stream short even though the HTTP status was 2xx.
fn stream_element(http_status: u16, element: &RawValue) -> Result<ResponseBatch, QueryError> {
    let marker: StreamElement = serde_json::from_str(element.get())?;
    if marker.error.is_some() {
        let failure = parse_failure(http_status, element.get());
        debug!(failure = %failure, "searchStream ended with an error element");
        return Err(QueryError::Api(failure));
    }
    Ok(serde_json::from_str(element.get())?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    results: Vec<RawRow>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    field_mask: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

/// Fetches one page per `next()`, following `nextPageToken`.
struct PagedSearch<'a> {
    service: &'a GoogleAdsService,
    url: String,
    query: String,
    page_token: Option<String>,
    done: bool,
}

impl PagedSearch<'_> {
    fn fetch_page(&self) -> Result<SearchPage, QueryError> {
        let mut body = json!({ "query": self.query });
        if let Some(token) = &self.page_token {
            body["pageToken"] = json!(token);
        }
        let response = self.service.post(&self.url, &body)?;
        let text = response.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Iterator for PagedSearch<'_> {
    type Item = Result<ResponseBatch, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = match self.fetch_page() {
            Ok(page) => page,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        self.page_token = page.next_page_token.filter(|t| !t.is_empty());
        self.done = self.page_token.is_none();
        debug!(rows = page.results.len(), more = !self.done, "fetched page");
        Some(Ok(ResponseBatch {
            results: page.results,
            field_mask: page.field_mask,
            request_id: page.request_id,
        }))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<FailureDetail>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureDetail {
    #[serde(default)]
    errors: Vec<FailureError>,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureError {
    #[serde(default)]
    error_code: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    location: Option<FailureLocation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureLocation {
    #[serde(default)]
    field_path_elements: Vec<FieldPathElement>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldPathElement {
    field_name: String,
    #[serde(default)]
    index: Option<u64>,
}

/// Decode an error body. `searchStream` wraps it in a one-element array;
/// anything unrecognised is kept verbatim as the message.
pub(crate) fn parse_failure(http_status: u16, body: &str) -> ApiFailure {
    let envelope = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .map(|value| match value {
            serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        })
        .and_then(|value| serde_json::from_value::<ErrorEnvelope>(value).ok());

    let Some(ErrorEnvelope { error }) = envelope else {
        return ApiFailure {
            http_status,
            status: format!("HTTP {http_status}"),
            message: body.trim().to_string(),
            request_id: None,
            errors: Vec::new(),
        };
    };

    let request_id = error.details.iter().find_map(|d| d.request_id.clone());
    let errors = error
        .details
        .into_iter()
        .flat_map(|detail| detail.errors)
        .map(|e| ApiErrorDetail {
            code: error_code_text(&e.error_code),
            message: e.message,
            field_path: e
                .location
                .map(|loc| {
                    loc.field_path_elements
                        .into_iter()
                        .map(|el| match el.index {
                            Some(i) => format!("{}[{}]", el.field_name, i),
                            None => el.field_name,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();

    ApiFailure {
        http_status: error.code.unwrap_or(http_status),
        status: if error.status.is_empty() {
            format!("HTTP {http_status}")
        } else {
            error.status
        },
        message: error.message,
        request_id,
        errors,
    }
}

fn error_code_text(code: &serde_json::Map<String, serde_json::Value>) -> Option<String> {
    if code.is_empty() {
        return None;
    }
    let parts: Vec<String> = code
        .iter()
        .map(|(category, value)| match value.as_str() {
            Some(name) => format!("{category}: {name}"),
            None => format!("{category}: {value}"),
        })
        .collect();
    Some(parts.join(", "))
}
