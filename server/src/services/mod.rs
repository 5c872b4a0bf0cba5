//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own outbound calls so route handlers can stay focused on
//! protocol translation and cookie plumbing.

pub mod backend;
