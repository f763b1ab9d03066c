/// Middleware modules for the API server
///
/// - Bearer-token authentication

pub mod auth;

pub use auth::{require_auth, AuthContext};
