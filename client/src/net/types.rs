//! Shared wire-protocol DTOs for the client/backend boundary.
//!
//! DESIGN
//! ======
//! `LoginResponse` keeps unknown fields so callers see the backend's full
//! success body, not just the token.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login credentials. Never persisted beyond the request carrying them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Backend success body for `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque bearer token issued by the backend.
    pub access_token: String,
    /// Token scheme, usually `"bearer"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Any other fields the backend returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Extract a usable `access_token` from a backend login body.
///
/// Missing, non-string, and empty tokens all count as "no token".
#[must_use]
pub fn access_token(body: &Value) -> Option<&str> {
    body.get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
}
