//! Client for the portal session gateway (cookie path).
//!
//! SYSTEM CONTEXT
//! ==============
//! The gateway keeps the bearer token in an HTTP-only cookie, so this client
//! never sees the token. It relies on reqwest's cookie jar to replay the
//! session cookie and asks `/api/auth/me` who the session belongs to.

#[cfg(test)]
#[path = "portal_test.rs"]
mod portal_test;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use super::auth::ClientError;
use super::types::Credentials;
use super::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS, join_url};
use crate::util::claims::UntrustedClaims;

pub const GATEWAY_LOGIN_PATH: &str = "/api/auth/login";
pub const GATEWAY_LOGOUT_PATH: &str = "/api/auth/logout";
pub const GATEWAY_ME_PATH: &str = "/api/auth/me";

#[derive(Clone, Debug)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
}

impl PortalClient {
    /// Build a client with its own cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, base_url: base_url.into() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/auth/login`; on success the session cookie lands in the jar.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Authentication`] with the gateway's status and
    /// body on any non-success response.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ClientError> {
        let response = self
            .http
            .post(join_url(&self.base_url, GATEWAY_LOGIN_PATH))
            .json(credentials)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let payload = response.json::<Value>().await.unwrap_or(Value::Null);
        Err(ClientError::Authentication { status: status.as_u16(), payload })
    }

    /// `GET /api/auth/me`. `Ok(None)` when the gateway reports no session.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or unexpected statuses.
    pub async fn me(&self) -> Result<Option<UntrustedClaims>, ClientError> {
        let response = self.http.get(join_url(&self.base_url, GATEWAY_ME_PATH)).send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED => Ok(None),
            status if status.is_success() => Ok(Some(
                response
                    .json::<UntrustedClaims>()
                    .await
                    .map_err(|e| ClientError::InvalidResponse(e.to_string()))?,
            )),
            status => {
                let payload = response.json::<Value>().await.unwrap_or(Value::Null);
                Err(ClientError::Authentication { status: status.as_u16(), payload })
            }
        }
    }

    /// `POST /api/auth/logout`, clearing the session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or non-success statuses.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .post(join_url(&self.base_url, GATEWAY_LOGOUT_PATH))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(ClientError::Authentication { status: status.as_u16(), payload: Value::Null })
    }
}
