//! Authenticated fetch wrapper.
//!
//! Decorates arbitrary JSON requests with the stored bearer token. No
//! retries, no token refresh.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use super::http_client;
use crate::state::storage::TokenStore;

/// Message used when an error body names no reason.
pub const FALLBACK_ERROR: &str = "API request failed";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success status; `message` follows `detail.error` > `error` > fallback.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Method, extra headers, and optional JSON body for one request.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { method: Method::GET, headers: HeaderMap::new(), body: None }
    }
}

impl RequestOptions {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Pick the most specific error message out of an error body.
#[must_use]
pub fn error_message(body: &Value) -> String {
    fn non_empty(value: Option<&Value>) -> Option<&str> {
        value.and_then(Value::as_str).filter(|message| !message.is_empty())
    }
    non_empty(body.get("detail").and_then(|detail| detail.get("error")))
        .or_else(|| non_empty(body.get("error")))
        .unwrap_or(FALLBACK_ERROR)
        .to_owned()
}

/// Merge caller headers with the JSON content type and optional bearer token.
///
/// # Errors
///
/// Returns an error if the token is not a valid header value.
pub fn build_headers(extra: &HeaderMap, token: Option<&str>) -> Result<HeaderMap, ApiError> {
    let mut headers = extra.clone();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    match token {
        Some(token) => {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }
        None => {
            headers.remove(AUTHORIZATION);
        }
    }
    Ok(headers)
}

/// Fetch wrapper bound to a token store.
#[derive(Clone)]
pub struct AuthedFetch {
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
}

impl AuthedFetch {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Ok(Self::with_http(http_client()?, store))
    }

    #[must_use]
    pub fn with_http(http: reqwest::Client, store: Arc<dyn TokenStore>) -> Self {
        Self { http, store }
    }

    /// Send `options` to `url` and return the parsed JSON body.
    ///
    /// An empty success body yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for non-success responses, otherwise
    /// transport and decode failures.
    pub async fn fetch(&self, url: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let token = self.store.get();
        let headers = build_headers(&options.headers, token.as_deref())?;

        let request = self.http.request(options.method, url).headers(headers);
        let request = match &options.body {
            Some(body) => request.body(serde_json::to_vec(body)?),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);
            let message = error_message(&body);
            tracing::debug!(status = status.as_u16(), %message, "api request failed");
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
