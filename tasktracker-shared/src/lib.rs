//! # Task Tracker Shared Library
//!
//! This crate contains the authentication and session core used by the
//! Task Tracker API server and the maintenance worker.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, access-token codec, refresh-token helpers
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migrations
//! - `session`: Store abstractions and the session state machine
//! - `config`: Session configuration loaded from the environment

pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod session;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
