//! Utility helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Token payload decoding and route-guard rules live here so the session
//! object, pages, and the server's who-am-I route share one implementation.

pub mod auth;
pub mod claims;
