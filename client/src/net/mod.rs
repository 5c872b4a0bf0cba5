//! Networking modules for the backend and the portal gateway.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` talks to the authentication backend directly, `portal` talks to the
//! cookie-based session gateway, `api` decorates arbitrary requests with the
//! stored bearer token, and `types` defines the shared wire schema.

pub mod api;
pub mod auth;
pub mod portal;
pub mod types;

use std::time::Duration;

pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Build the shared HTTP client with bounded request and connect timeouts.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
}

/// Join a base URL and an absolute path without doubling slashes.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
