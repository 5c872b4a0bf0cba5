use super::*;
use crate::routes::app;
use crate::state::test_helpers::{MockBackend, test_app_state, unconfigured_app_state};
use axum::body::Body;
use axum::http::{Request, header};
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Vec<String>, Value) {
    let response = app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, cookies, body)
}

fn login_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

const CREDENTIALS: &str = r#"{"email":"a@b.com","password":"x"}"#;

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_sets_http_only_cookie() {
    let (state, backend) = test_app_state(MockBackend::replying(200, json!({"access_token": "h.e.s"})), true);
    let (status, cookies, body) = send(state, login_request(CREDENTIALS)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert_eq!(cookies.len(), 1);
    let cookie = &cookies[0];
    assert!(cookie.starts_with("better-auth.session_token=h.e.s"), "{cookie}");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(cookie.contains("Secure"));
    assert_eq!(backend.login_calls(), 1);
    let forwarded = backend.last_credentials.lock().unwrap().clone().unwrap();
    assert_eq!(forwarded, Credentials::new("a@b.com", "x"));
}

#[tokio::test]
async fn login_success_in_development_omits_secure() {
    let (state, _) = test_app_state(MockBackend::replying(200, json!({"access_token": "tok"})), false);
    let (_, cookies, _) = send(state, login_request(CREDENTIALS)).await;
    assert!(!cookies[0].contains("Secure"));
}

#[tokio::test]
async fn login_success_body_never_contains_token() {
    let (state, _) = test_app_state(
        MockBackend::replying(200, json!({"access_token": "secret-token", "token_type": "bearer"})),
        true,
    );
    let (_, _, body) = send(state, login_request(CREDENTIALS)).await;
    assert!(!body.to_string().contains("secret-token"));
}

#[tokio::test]
async fn login_relays_backend_rejection_exactly() {
    let (state, _) = test_app_state(MockBackend::replying(401, json!({"error": "bad credentials"})), true);
    let (status, cookies, body) = send(state, login_request(CREDENTIALS)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "bad credentials"}));
    assert!(cookies.is_empty());
}

#[tokio::test]
async fn login_relays_unusual_backend_status() {
    let detail = json!({"detail": [{"loc": ["body", "email"], "msg": "field required"}]});
    let (state, _) = test_app_state(MockBackend::replying(422, detail.clone()), true);
    let (status, _, body) = send(state, login_request(CREDENTIALS)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, detail);
}

#[tokio::test]
async fn login_success_without_token_is_integrity_failure() {
    let (state, _) = test_app_state(MockBackend::replying(200, json!({})), true);
    let (status, cookies, body) = send(state, login_request(CREDENTIALS)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": NO_TOKEN_MESSAGE}));
    assert!(cookies.is_empty());
}

#[tokio::test]
async fn login_success_with_empty_token_is_integrity_failure() {
    let (state, _) = test_app_state(MockBackend::replying(200, json!({"access_token": ""})), true);
    let (status, cookies, _) = send(state, login_request(CREDENTIALS)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(cookies.is_empty());
}

#[tokio::test]
async fn login_malformed_body_is_generic_500_without_backend_call() {
    for body in ["not json", "{}", r#"{"email":"a@b.com"}"#, "null"] {
        let (state, backend) = test_app_state(MockBackend::replying(200, json!({"access_token": "t"})), true);
        let (status, cookies, resp) = send(state, login_request(body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body {body:?}");
        assert_eq!(resp, json!({"error": INTERNAL_ERROR_MESSAGE}));
        assert!(cookies.is_empty());
        assert_eq!(backend.login_calls(), 0);
    }
}

#[tokio::test]
async fn login_without_backend_url_is_generic_500() {
    let (status, _, body) = send(unconfigured_app_state(), login_request(CREDENTIALS)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": INTERNAL_ERROR_MESSAGE}));
}

#[tokio::test]
async fn login_transport_failure_is_generic_500() {
    let (state, _) = test_app_state(MockBackend::unreachable(), true);
    let (status, cookies, body) = send(state, login_request(CREDENTIALS)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": INTERNAL_ERROR_MESSAGE}));
    assert!(cookies.is_empty());
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_expires_cookie() {
    let (state, _) = test_app_state(MockBackend::replying(200, json!({})), true);
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();
    let (status, cookies, body) = send(state, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("better-auth.session_token=;"), "{}", cookies[0]);
    assert!(cookies[0].contains("Max-Age=0"));
    assert!(cookies[0].contains("HttpOnly"));
}

// =============================================================================
// me
// =============================================================================

fn me_request(cookie: Option<&str>) -> Request<Body> {
    let builder = Request::builder().uri("/api/auth/me");
    let builder = match cookie {
        Some(token) => builder.header(header::COOKIE, format!("{SESSION_COOKIE_NAME}={token}")),
        None => builder,
    };
    builder.body(Body::empty()).unwrap()
}

fn token_for_email(email: &str) -> String {
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json!({"email": email}).to_string());
    format!("h.{payload}.s")
}

#[tokio::test]
async fn me_without_cookie_is_unauthorized() {
    let (state, _) = test_app_state(MockBackend::replying(200, json!({})), true);
    let (status, _, body) = send(state, me_request(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": NOT_AUTHENTICATED_MESSAGE}));
}

#[tokio::test]
async fn me_with_valid_cookie_returns_claims() {
    let token = token_for_email("a@b.com");
    let (state, _) = test_app_state(MockBackend::replying(200, json!({})).accepting(&token), true);
    let (status, _, body) = send(state, me_request(Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"email": "a@b.com"}));
}

#[tokio::test]
async fn me_with_rejected_cookie_is_unauthorized() {
    let (state, _) = test_app_state(MockBackend::replying(200, json!({})).accepting("other"), true);
    let (status, _, _) = send(state, me_request(Some("stale"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_with_unreachable_backend_is_unauthorized() {
    let (state, _) = test_app_state(MockBackend::unreachable(), true);
    let (status, _, _) = send(state, me_request(Some("tok"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_without_backend_url_is_internal_error() {
    let (status, _, _) = send(unconfigured_app_state(), me_request(Some("tok"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn healthz_is_ok() {
    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, _, _) = send(unconfigured_app_state(), request).await;
    assert_eq!(status, StatusCode::OK);
}
