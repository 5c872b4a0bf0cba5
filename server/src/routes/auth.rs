//! Auth routes: session establishment, session clearing, who-am-I.
//!
//! SYSTEM CONTEXT
//! ==============
//! The gateway never issues tokens. `login` forwards credentials to the
//! backend and, on success, parks the returned bearer token in an HTTP-only
//! cookie so page scripts never see it. Backend rejections are relayed with
//! their original status and body; local failures collapse to a generic 500.

use axum::body::Bytes;
use axum::extract::{FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use portal_client::{Credentials, UntrustedClaims};
use portal_client::net::types::access_token;
use serde_json::json;
use time::Duration;

use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "better-auth.session_token";
pub const SESSION_MAX_AGE: Duration = Duration::days(7);

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";
pub const NO_TOKEN_MESSAGE: &str = "Authentication successful, but no token was provided.";
pub const NOT_AUTHENTICATED_MESSAGE: &str = "Not authenticated";

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(SESSION_MAX_AGE)
        .build()
}

fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// Raw bearer token from the session cookie. Presence says nothing about
/// validity; handlers must still ask the backend.
pub struct SessionToken(pub String);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(error_response(StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED_MESSAGE));
        }
        Ok(Self(token.to_owned()))
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/login`: proxy credentials, set the session cookie.
pub async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    // Unparseable bodies get the same generic 500 as server faults.
    let credentials: Credentials = match serde_json::from_slice(&body) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "login body parse failed");
            return internal_error();
        }
    };

    let Some(backend) = &state.backend else {
        tracing::error!("backend API URL is not configured");
        return internal_error();
    };

    let reply = match backend.login(&credentials).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "backend login call failed");
            return internal_error();
        }
    };

    if !reply.is_success() {
        tracing::info!(status = reply.status, "backend rejected login; relaying");
        let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
        return (status, Json(reply.body)).into_response();
    }

    let Some(token) = access_token(&reply.body) else {
        tracing::error!("backend login succeeded without an access_token");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, NO_TOKEN_MESSAGE);
    };

    let jar = CookieJar::new().add(session_cookie(token.to_owned(), state.config.cookie_secure));
    (jar, Json(json!({ "success": true }))).into_response()
}

/// `POST /api/auth/logout`: expire the session cookie. Always succeeds.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let jar = CookieJar::new().add(expired_session_cookie(state.config.cookie_secure));
    (jar, Json(json!({ "success": true })))
}

/// `GET /api/auth/me`: untrusted claims for a backend-validated session.
pub async fn me(State(state): State<AppState>, SessionToken(token): SessionToken) -> Response {
    let Some(backend) = &state.backend else {
        tracing::error!("backend API URL is not configured");
        return internal_error();
    };

    match backend.validate(&token).await {
        Ok(true) => Json(UntrustedClaims::for_display(&token)).into_response(),
        Ok(false) => error_response(StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED_MESSAGE),
        Err(e) => {
            tracing::warn!(error = %e, "session validation failed; treating as unauthenticated");
            error_response(StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED_MESSAGE)
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
