//! Bearer-token auth client for the external authentication backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the script-accessible token path: the token returned by
//! `POST /auth/login` is persisted in a [`TokenStore`] and replayed as a
//! bearer header. The portal gateway's cookie path lives in `net::portal`.
//!
//! ERROR HANDLING
//! ==============
//! `login` surfaces every failure. `validate_token` collapses any doubt
//! (transport errors, non-success statuses, unreadable bodies) to `false`.
//! `logout` never fails.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use serde_json::Value;

use super::types::{Credentials, LoginResponse, access_token};
use super::{http_client, join_url};
use crate::state::storage::{StorageError, TokenStore};

pub const LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_VALIDATE_PATH: &str = "/auth/validate";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend rejected the request; `payload` is its JSON error body.
    #[error("authentication failed with status {status}: {payload}")]
    Authentication { status: u16, payload: Value },
    #[error("authentication succeeded but no token was provided")]
    MissingToken,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Client for the backend's login and token-validation endpoints.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    backend_url: String,
    validate_path: String,
    store: Arc<dyn TokenStore>,
}

impl AuthClient {
    /// Build a client with the default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(backend_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        Ok(Self::with_http(http_client()?, backend_url, store))
    }

    #[must_use]
    pub fn with_http(http: reqwest::Client, backend_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
        Self { http, backend_url: backend_url.into(), validate_path: DEFAULT_VALIDATE_PATH.to_owned(), store }
    }

    /// Override the backend's token-validation path.
    #[must_use]
    pub fn with_validate_path(mut self, path: impl Into<String>) -> Self {
        self.validate_path = path.into();
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// `POST {backend}/auth/login`, then persist the returned token.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Authentication`] when the backend responds non-2xx.
    /// - [`ClientError::MissingToken`] when a 2xx body carries no token.
    /// - Transport, decode, and storage failures otherwise.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        let url = join_url(&self.backend_url, LOGIN_PATH);
        let response = self.http.post(url).json(credentials).send().await?;
        let status = response.status();

        if !status.is_success() {
            let payload = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(ClientError::Authentication { status: status.as_u16(), payload });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        if access_token(&body).is_none() {
            return Err(ClientError::MissingToken);
        }
        let login: LoginResponse =
            serde_json::from_value(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        self.store.set(&login.access_token)?;
        tracing::debug!("login succeeded; token stored");
        Ok(login)
    }

    /// Read the persisted token. No network call.
    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        self.store.get()
    }

    /// Ask the backend whether `token` is currently valid.
    ///
    /// A 2xx response counts as valid unless its JSON body says
    /// `{"valid": false}`. Everything else is invalid.
    pub async fn validate_token(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let url = join_url(&self.backend_url, &self.validate_path);
        let response = match self.http.get(url).bearer_auth(token).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "token validation request failed; treating token as invalid");
                return false;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "token rejected by backend");
            return false;
        }
        let body = response.bytes().await.unwrap_or_default();
        validity_from_body(&body)
    }

    /// Drop the persisted token. Safe to call when none is stored.
    pub fn logout(&self) {
        self.store.clear();
    }
}

/// Interpret a 2xx validation body.
fn validity_from_body(body: &[u8]) -> bool {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Bool(valid)) => valid,
        Ok(value) => value.get("valid").and_then(Value::as_bool).unwrap_or(true),
        Err(_) => true,
    }
}
