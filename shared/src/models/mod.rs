//! Data models
//!
//! Persisted records shared between the venue server and its clients.

pub mod user;

// Re-exports
pub use user::*;
