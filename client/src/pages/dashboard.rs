//! Dashboard page: the authenticated landing route.
//!
//! SYSTEM CONTEXT
//! ==============
//! Greets the user by their (untrusted) display name and links to the task
//! list, scoped to the user id when the token names one.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::fmt::Write;

use crate::state::session::SessionState;
use crate::util::auth::{Route, protect};
use crate::util::claims::UntrustedClaims;

pub const TASKS_PATH: &str = "/dashboard/tasks";

/// A dashboard tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub title: &'static str,
    pub description: &'static str,
    /// Link target; `None` renders as a disabled "Coming Soon" action.
    pub href: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardView {
    pub welcome_name: String,
    pub cards: Vec<Card>,
}

impl DashboardView {
    #[must_use]
    pub fn for_user(user: &UntrustedClaims) -> Self {
        Self {
            welcome_name: user.display_name().to_owned(),
            cards: vec![
                Card {
                    title: "Manage Tasks",
                    description: "View and manage your tasks.",
                    href: Some(tasks_href(user.user_id().as_deref())),
                },
                Card { title: "Account Settings", description: "Update your account information.", href: None },
            ],
        }
    }

    /// Plain-text rendering for terminals and logs.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dashboard");
        let _ = writeln!(out, "Welcome, {}!", self.welcome_name);
        for card in &self.cards {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", card.title);
            let _ = writeln!(out, "  {}", card.description);
            match &card.href {
                Some(href) => {
                    let _ = writeln!(out, "  -> {href}");
                }
                None => {
                    let _ = writeln!(out, "  [Coming Soon]");
                }
            }
        }
        out
    }
}

/// Guarded dashboard route.
#[must_use]
pub fn dashboard(state: &SessionState) -> Route<DashboardView> {
    protect(state, DashboardView::for_user)
}

#[must_use]
pub fn tasks_href(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) => format!("{TASKS_PATH}?userId={id}"),
        None => TASKS_PATH.to_owned(),
    }
}
