//! Authentication backend adapter.
//!
//! DESIGN
//! ======
//! Routes talk to the backend through the `AuthBackend` trait so tests can
//! substitute a mock. `HttpBackend` is the only production implementation and
//! returns non-success replies as data, not errors, because the login route
//! relays them verbatim.

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::time::Duration;

use portal_client::Credentials;
use portal_client::net::auth::DEFAULT_VALIDATE_PATH;
use serde_json::Value;

use crate::config::BackendTimeouts;

pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Request(String),
    #[error("backend response parse failed: {0}")]
    Parse(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Status and JSON body of a backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: u16,
    pub body: Value,
}

impl BackendReply {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Forward credentials to the backend's login endpoint.
    async fn login(&self, credentials: &Credentials) -> Result<BackendReply, BackendError>;

    /// Ask the backend whether `token` is currently valid.
    async fn validate(&self, token: &str) -> Result<bool, BackendError>;
}

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    validate_path: String,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>, timeouts: BackendTimeouts) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.into(), validate_path: DEFAULT_VALIDATE_PATH.to_owned() })
    }

    /// Use a non-default token validation path.
    #[must_use]
    pub fn with_validate_path(mut self, path: impl Into<String>) -> Self {
        self.validate_path = path.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl AuthBackend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<BackendReply, BackendError> {
        let resp = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(credentials)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        Ok(BackendReply { status, body })
    }

    async fn validate(&self, token: &str) -> Result<bool, BackendError> {
        let resp = self
            .http
            .get(self.url(&self.validate_path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Ok(false);
        }
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        Ok(body.get("valid").and_then(Value::as_bool).unwrap_or(true))
    }
}
