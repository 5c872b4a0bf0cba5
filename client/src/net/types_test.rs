use super::*;
use serde_json::json;

#[test]
fn credentials_debug_redacts_password() {
    let creds = Credentials::new("a@b.com", "hunter2");
    let rendered = format!("{creds:?}");
    assert!(rendered.contains("a@b.com"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn credentials_serialize_as_plain_object() {
    let creds = Credentials::new("a@b.com", "x");
    assert_eq!(serde_json::to_value(&creds).unwrap(), json!({"email": "a@b.com", "password": "x"}));
}

#[test]
fn login_response_keeps_extra_fields() {
    let body = json!({"access_token": "h.e.s", "token_type": "bearer", "user_id": 7});
    let resp: LoginResponse = serde_json::from_value(body).unwrap();
    assert_eq!(resp.access_token, "h.e.s");
    assert_eq!(resp.token_type.as_deref(), Some("bearer"));
    assert_eq!(resp.extra.get("user_id"), Some(&json!(7)));
}

#[test]
fn access_token_present() {
    assert_eq!(access_token(&json!({"access_token": "tok"})), Some("tok"));
}

#[test]
fn access_token_missing_empty_or_wrong_type() {
    assert_eq!(access_token(&json!({})), None);
    assert_eq!(access_token(&json!({"access_token": ""})), None);
    assert_eq!(access_token(&json!({"access_token": 42})), None);
    assert_eq!(access_token(&json!(null)), None);
}
