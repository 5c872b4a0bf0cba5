//! Unverified token payload decoding.
//!
//! TRUST MODEL
//! ===========
//! Tokens are treated as `header.payload.signature` with a base64url JSON
//! payload. The signature is never checked, so everything decoded here is
//! display data only. Callers must confirm the token with the backend before
//! showing it and must never make access decisions from it.

#[cfg(test)]
#[path = "claims_test.rs"]
mod claims_test;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fallback identifier shown when a payload names nobody.
pub const ANONYMOUS_DISPLAY_NAME: &str = "User";

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("token must have three dot-separated segments, found {0}")]
    Segments(usize),
    #[error("token payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token payload is not a JSON object")]
    NotAnObject,
}

/// Untrusted projection of a token payload (email, username, user id, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UntrustedClaims(Map<String, Value>);

impl UntrustedClaims {
    /// Decode the middle segment of `token` without verifying anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the token does not have exactly three segments or
    /// the payload is not a base64-encoded JSON object.
    pub fn from_token(token: &str) -> Result<Self, ClaimsError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(ClaimsError::Segments(segments.len()));
        }
        let bytes = decode_segment(segments[1])?;
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ClaimsError::NotAnObject),
        }
    }

    /// Decode for display, falling back to empty claims when the payload is
    /// unreadable. Only use on tokens the backend has already accepted.
    #[must_use]
    pub fn for_display(token: &str) -> Self {
        Self::from_token(token).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "token payload not decodable; showing anonymous claims");
            Self::default()
        })
    }

    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.non_empty_str("email")
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.non_empty_str("username")
    }

    /// `user_id`, falling back to the standard `sub` claim. Numeric ids are
    /// rendered as decimal strings.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        ["user_id", "sub"].iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Email, else username, else [`ANONYMOUS_DISPLAY_NAME`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.email()
            .or_else(|| self.username())
            .unwrap_or(ANONYMOUS_DISPLAY_NAME)
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Accept both base64url and standard alphabets, padded or not.
fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_NO_PAD.decode(normalized)
}
