//! # Task Tracker API Server Library
//!
//! HTTP binding for the session core: routing, error mapping, the refresh
//! token cookie and bearer-token authentication.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `cookie`: Refresh-token cookie lifecycle
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Bearer-token authentication
//! - `response`: Success envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod cookie;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
