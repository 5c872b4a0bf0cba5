//! Page view models for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page goes through `util::auth::protect` and produces a plain view
//! model; front ends decide how to draw it.

pub mod dashboard;
