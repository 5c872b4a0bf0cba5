//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Session` is the explicit replacement for an ambient auth context: views
//! receive it by reference, read snapshots, and subscribe to changes through a
//! `watch` channel. State only changes through `initialize`, `login`, and
//! `logout`.
//!
//! TRUST MODEL
//! ===========
//! `user` holds [`UntrustedClaims`]: display data decoded from a token the
//! backend has accepted. It is never an authorization decision.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::net::auth::{AuthClient, ClientError};
use crate::net::portal::PortalClient;
use crate::net::types::Credentials;
use crate::util::auth::LOGIN_PATH;
use crate::util::claims::UntrustedClaims;

/// Destination after a successful login.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<UntrustedClaims>,
    pub is_loading: bool,
}

impl SessionState {
    /// State at mount time, before the stored token has been checked.
    #[must_use]
    pub fn loading() -> Self {
        Self { user: None, is_loading: true }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Route changes requested by the session.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

pub struct Session {
    auth: AuthClient,
    portal: Option<PortalClient>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
    initialized: AtomicBool,
}

impl Session {
    /// Create a session in the loading state. `portal`, when present, is told
    /// about logouts so it can clear its cookie.
    #[must_use]
    pub fn new(auth: AuthClient, portal: Option<PortalClient>, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        Self { auth, portal, navigator, state, initialized: AtomicBool::new(false) }
    }

    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Current state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receive every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Validate any stored token and populate `user`. Runs once per session;
    /// later calls return immediately.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return;
        }
        self.state.send_modify(|s| s.is_loading = true);

        let user = match self.auth.get_token() {
            Some(token) => {
                if self.auth.validate_token(&token).await {
                    Some(UntrustedClaims::for_display(&token))
                } else {
                    tracing::info!("stored token rejected; clearing local session");
                    self.auth.logout();
                    None
                }
            }
            None => None,
        };

        self.state.send_modify(|s| {
            s.user = user;
            s.is_loading = false;
        });
    }

    /// Log in through the auth client and go to the dashboard.
    ///
    /// # Errors
    ///
    /// Propagates the auth client's error; state is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .auth
            .login(&Credentials::new(email, password))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "login failed"))?;

        let user = UntrustedClaims::for_display(&response.access_token);
        self.state.send_modify(|s| s.user = Some(user));
        self.navigator.navigate(DASHBOARD_PATH);
        Ok(())
    }

    /// Clear local credentials, tell the gateway, reset state, and go to the
    /// login page. Never fails.
    pub async fn logout(&self) {
        self.auth.logout();

        // Fire-and-forget: local state is cleared whatever the gateway says.
        if let Some(portal) = &self.portal {
            if let Err(e) = portal.logout().await {
                tracing::warn!(error = %e, "gateway logout failed; local session cleared anyway");
            }
        }

        self.state.send_modify(|s| s.user = None);
        self.navigator.navigate(LOGIN_PATH);
    }
}
