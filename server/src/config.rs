//! Gateway configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS: u64 = 10;

pub use portal_client::net::auth::DEFAULT_VALIDATE_PATH;

/// Backend base URL variables, in lookup order.
pub const BACKEND_URL_VARS: [&str; 2] = ["NEXT_PUBLIC_BETTER_AUTH_URL", "BETTER_AUTH_URL"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for BackendTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Authentication backend base URL without a trailing slash. `None` makes
    /// every backend-bound request fail with 500.
    pub backend_url: Option<String>,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    pub timeouts: BackendTimeouts,
    /// Backend path for token validation, always starting with `/`.
    pub validate_path: String,
}

impl ServerConfig {
    /// Build typed config from the process environment.
    ///
    /// - `PORT`: default 3000
    /// - `NEXT_PUBLIC_BETTER_AUTH_URL` or `BETTER_AUTH_URL`: backend base URL
    /// - `COOKIE_SECURE`: explicit boolean override for the `Secure` flag
    /// - `APP_ENV` / `NODE_ENV`: `development` or `test` drop the `Secure` flag
    /// - `BACKEND_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BACKEND_CONNECT_TIMEOUT_SECS`: default 10
    /// - `BACKEND_VALIDATE_PATH`: default `/auth/validate`
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let backend_url = BACKEND_URL_VARS
            .iter()
            .find_map(|key| normalize_backend_url(lookup(key).as_deref()));

        let environment = lookup("APP_ENV").or_else(|| lookup("NODE_ENV"));
        let cookie_secure = lookup("COOKIE_SECURE")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or_else(|| !is_local_environment(environment.as_deref()));

        let timeouts = BackendTimeouts {
            request_secs: parse_u64(lookup("BACKEND_REQUEST_TIMEOUT_SECS"), DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("BACKEND_CONNECT_TIMEOUT_SECS"), DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS),
        };

        let validate_path = normalize_path(lookup("BACKEND_VALIDATE_PATH").as_deref())
            .unwrap_or_else(|| DEFAULT_VALIDATE_PATH.to_owned());

        Ok(Self { port, backend_url, cookie_secure, timeouts, validate_path })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_backend_url(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn normalize_path(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(if trimmed.starts_with('/') { trimmed.to_owned() } else { format!("/{trimmed}") })
}

/// Unset counts as production so cookies stay `Secure` by default.
fn is_local_environment(environment: Option<&str>) -> bool {
    matches!(
        environment.map(|e| e.trim().to_ascii_lowercase()).as_deref(),
        Some("development" | "dev" | "local" | "test")
    )
}
