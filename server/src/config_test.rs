use super::*;
use std::collections::HashMap;

fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    ServerConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_with_empty_environment() {
    let config = config_from(&[]).unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.backend_url, None);
    assert!(config.cookie_secure);
    assert_eq!(config.timeouts, BackendTimeouts::default());
}

#[test]
fn backend_url_trims_trailing_slash() {
    let config = config_from(&[("NEXT_PUBLIC_BETTER_AUTH_URL", "http://auth.local:8000/")]).unwrap();
    assert_eq!(config.backend_url.as_deref(), Some("http://auth.local:8000"));
}

#[test]
fn backend_url_falls_back_to_second_variable() {
    let config = config_from(&[("NEXT_PUBLIC_BETTER_AUTH_URL", "  "), ("BETTER_AUTH_URL", "http://b")]).unwrap();
    assert_eq!(config.backend_url.as_deref(), Some("http://b"));
}

#[test]
fn empty_backend_url_is_unconfigured() {
    let config = config_from(&[("NEXT_PUBLIC_BETTER_AUTH_URL", "")]).unwrap();
    assert_eq!(config.backend_url, None);
}

#[test]
fn development_environment_disables_secure_cookies() {
    assert!(!config_from(&[("NODE_ENV", "development")]).unwrap().cookie_secure);
    assert!(!config_from(&[("APP_ENV", "Test")]).unwrap().cookie_secure);
    assert!(config_from(&[("NODE_ENV", "production")]).unwrap().cookie_secure);
}

#[test]
fn app_env_takes_precedence_over_node_env() {
    let config = config_from(&[("APP_ENV", "production"), ("NODE_ENV", "development")]).unwrap();
    assert!(config.cookie_secure);
}

#[test]
fn cookie_secure_override_wins() {
    assert!(config_from(&[("NODE_ENV", "development"), ("COOKIE_SECURE", "yes")]).unwrap().cookie_secure);
    assert!(!config_from(&[("COOKIE_SECURE", "0")]).unwrap().cookie_secure);
}

#[test]
fn invalid_cookie_secure_falls_back_to_environment() {
    assert!(!config_from(&[("NODE_ENV", "dev"), ("COOKIE_SECURE", "maybe")]).unwrap().cookie_secure);
}

#[test]
fn invalid_port_is_an_error() {
    let err = config_from(&[("PORT", "eighty")]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPort(ref raw) if raw == "eighty"));
}

#[test]
fn timeouts_parse_with_defaults_on_garbage() {
    let config = config_from(&[("BACKEND_REQUEST_TIMEOUT_SECS", "5"), ("BACKEND_CONNECT_TIMEOUT_SECS", "x")]).unwrap();
    assert_eq!(config.timeouts.request_secs, 5);
    assert_eq!(config.timeouts.connect_secs, DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS);
}

#[test]
fn parse_bool_variants() {
    for raw in ["1", "true", "YES", " on "] {
        assert_eq!(parse_bool(raw), Some(true), "expected true for {raw:?}");
    }
    for raw in ["0", "False", "no", "off"] {
        assert_eq!(parse_bool(raw), Some(false), "expected false for {raw:?}");
    }
    assert_eq!(parse_bool(""), None);
    assert_eq!(parse_bool("maybe"), None);
}

#[test]
fn validate_path_defaults_and_overrides() {
    assert_eq!(config_from(&[]).unwrap().validate_path, DEFAULT_VALIDATE_PATH);
    assert_eq!(config_from(&[("BACKEND_VALIDATE_PATH", "  ")]).unwrap().validate_path, DEFAULT_VALIDATE_PATH);
    assert_eq!(config_from(&[("BACKEND_VALIDATE_PATH", "/api/v1/token/check")]).unwrap().validate_path, "/api/v1/token/check");
    assert_eq!(config_from(&[("BACKEND_VALIDATE_PATH", "session")]).unwrap().validate_path, "/session");
}
