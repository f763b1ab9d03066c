/// Refresh-token cookie lifecycle
///
/// The refresh token never appears in a response body. It travels only in
/// an `HttpOnly` cookie scoped to the auth routes:
///
/// ```text
/// Set-Cookie: refreshToken=<token>; Path=/api/v1/auth; Max-Age=604800; HttpOnly; SameSite=Lax
/// ```
///
/// With `COOKIE_SECURE=true` the cookie gains `Secure` and `SameSite=None`
/// so a frontend on another origin can send it.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Duration;

use crate::error::ApiError;

/// Cookie name
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Cookie path. Browsers only send it to the auth endpoints.
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

/// Attributes applied to every refresh cookie
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    /// `Secure` flag, also selects `SameSite=None`
    pub secure: bool,

    /// Lifetime of a set cookie, in whole seconds
    pub max_age_seconds: i64,
}

impl CookiePolicy {
    /// Builds a policy whose max-age matches the refresh-token lifetime
    pub fn new(secure: bool, refresh_token_ttl: Duration) -> Self {
        Self {
            secure,
            max_age_seconds: refresh_token_ttl.num_seconds(),
        }
    }

    /// `Set-Cookie` value carrying a refresh token
    pub fn set(&self, token: &str) -> Result<HeaderValue, ApiError> {
        self.render(token, self.max_age_seconds)
    }

    /// `Set-Cookie` value that makes the browser drop the cookie
    pub fn clear(&self) -> Result<HeaderValue, ApiError> {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> Result<HeaderValue, ApiError> {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}; HttpOnly",
            REFRESH_COOKIE_NAME, value, REFRESH_COOKIE_PATH, max_age
        );

        if self.secure {
            cookie.push_str("; Secure; SameSite=None");
        } else {
            cookie.push_str("; SameSite=Lax");
        }

        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::InternalError(format!("Invalid cookie header: {}", e)))
    }
}

/// Extracts the refresh token from the request's `Cookie` headers
///
/// Returns `None` if the cookie is absent or empty.
pub fn read_refresh_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
