//! Client-side state: persisted bearer token and reactive session state.

pub mod session;
pub mod storage;
