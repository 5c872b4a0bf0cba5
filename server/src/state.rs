//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the parsed config and the backend adapter, which is `None` when no
//! backend URL is configured.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::backend::{AuthBackend, BackendError, HttpBackend};

/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub backend: Option<Arc<dyn AuthBackend>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, backend: Option<Arc<dyn AuthBackend>>) -> Self {
        Self { config: Arc::new(config), backend }
    }

    /// Build state with an HTTP backend when `backend_url` is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn from_config(config: ServerConfig) -> Result<Self, BackendError> {
        let backend = match &config.backend_url {
            Some(url) => {
                let backend = HttpBackend::new(url.clone(), config.timeouts)?
                    .with_validate_path(config.validate_path.clone());
                Some(Arc::new(backend) as Arc<dyn AuthBackend>)
            }
            None => None,
        };
        Ok(Self::new(config, backend))
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use portal_client::Credentials;
    use serde_json::Value;

    use super::*;
    use crate::config::BackendTimeouts;
    use crate::services::backend::BackendReply;

    /// Scripted backend. Login replies with `login_reply` (or a transport
    /// error when `None`); validation accepts exactly `valid_token`.
    pub struct MockBackend {
        pub login_reply: Option<BackendReply>,
        pub valid_token: Option<String>,
        pub validate_fails: bool,
        pub login_calls: AtomicUsize,
        pub last_credentials: Mutex<Option<Credentials>>,
    }

    impl MockBackend {
        #[must_use]
        pub fn replying(status: u16, body: Value) -> Self {
            Self {
                login_reply: Some(BackendReply { status, body }),
                valid_token: None,
                validate_fails: false,
                login_calls: AtomicUsize::new(0),
                last_credentials: Mutex::new(None),
            }
        }

        #[must_use]
        pub fn unreachable() -> Self {
            Self { login_reply: None, validate_fails: true, ..Self::replying(0, Value::Null) }
        }

        #[must_use]
        pub fn accepting(mut self, token: &str) -> Self {
            self.valid_token = Some(token.to_owned());
            self
        }

        pub fn login_calls(&self) -> usize {
            self.login_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl AuthBackend for MockBackend {
        async fn login(&self, credentials: &Credentials) -> Result<BackendReply, BackendError> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_credentials.lock().unwrap() = Some(credentials.clone());
            self.login_reply
                .clone()
                .ok_or_else(|| BackendError::Request("connection refused".into()))
        }

        async fn validate(&self, token: &str) -> Result<bool, BackendError> {
            if self.validate_fails {
                return Err(BackendError::Request("connection refused".into()));
            }
            Ok(self.valid_token.as_deref() == Some(token))
        }
    }

    #[must_use]
    pub fn test_config(cookie_secure: bool) -> ServerConfig {
        ServerConfig {
            port: 0,
            backend_url: Some("http://backend.test".into()),
            cookie_secure,
            timeouts: BackendTimeouts::default(),
            validate_path: crate::config::DEFAULT_VALIDATE_PATH.to_owned(),
        }
    }

    /// `AppState` backed by `backend`; also returns the mock for assertions.
    #[must_use]
    pub fn test_app_state(backend: MockBackend, cookie_secure: bool) -> (AppState, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let state = AppState::new(test_config(cookie_secure), Some(backend.clone() as Arc<dyn AuthBackend>));
        (state, backend)
    }

    /// `AppState` with no backend configured.
    #[must_use]
    pub fn unconfigured_app_state() -> AppState {
        let mut config = test_config(false);
        config.backend_url = None;
        AppState::new(config, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_without_url_has_no_backend() {
        let mut config = test_helpers::test_config(true);
        config.backend_url = None;
        let state = AppState::from_config(config).unwrap();
        assert!(state.backend.is_none());
    }

    #[test]
    fn from_config_with_url_builds_backend() {
        let state = AppState::from_config(test_helpers::test_config(true)).unwrap();
        assert!(state.backend.is_some());
        assert!(state.config.cookie_secure);
    }
}
