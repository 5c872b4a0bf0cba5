//! Shared route-guard rules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Protected pages must apply identical unauthenticated redirect behavior, so
//! they all go through [`protect`].

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::state::session::SessionState;
use crate::util::claims::UntrustedClaims;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// Outcome of guarding a protected page.
#[derive(Clone, Debug, PartialEq)]
pub enum Route<T> {
    /// Session validation has not finished yet.
    Loading,
    /// Not authenticated; navigate to the given path instead.
    Redirect(&'static str),
    /// Authenticated; render the page.
    Render(T),
}

/// Redirect whenever auth has loaded and no user is present.
#[must_use]
pub fn should_redirect_unauth(state: &SessionState) -> bool {
    !state.is_loading && state.user.is_none()
}

/// Run `render` only for an authenticated session.
pub fn protect<T, F>(state: &SessionState, render: F) -> Route<T>
where
    F: FnOnce(&UntrustedClaims) -> T,
{
    if state.is_loading {
        return Route::Loading;
    }
    match &state.user {
        Some(user) => Route::Render(render(user)),
        None => Route::Redirect(LOGIN_PATH),
    }
}
