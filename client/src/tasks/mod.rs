//! Todo tasks: the list behind the dashboard's "Manage Tasks" card.
//!
//! ARCHITECTURE
//! ============
//! `model` holds the task type and its validation rules, `store` the task
//! collection and its persistence, and `service` the operations a front end
//! calls. Tasks are local to the store; the auth backend never sees them.

pub mod model;
pub mod service;
pub mod store;
