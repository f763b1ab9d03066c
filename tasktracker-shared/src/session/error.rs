/// Session error taxonomy
///
/// Every failure a caller of [`SessionCore`](super::SessionCore) can observe
/// is one of the [`SessionError`] variants. Authentication failures carry an
/// [`AuthFailure`] reason whose message is deliberately generic.

use crate::auth::{jwt::JwtError, password::PasswordError};

/// Error raised by a store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violated (names the conflicting field)
    #[error("Duplicate value for {0}")]
    Duplicate(String),
}

/// Why an authentication attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Unknown email or wrong password. Indistinguishable on purpose.
    InvalidCredentials,

    /// No refresh token was presented
    MissingToken,

    /// Presented refresh token does not exist
    TokenNotFound,

    /// Presented refresh token was already used. All sessions were revoked.
    SessionInvalidated,

    /// Presented refresh token is past its expiry
    TokenExpired,
}

impl AuthFailure {
    /// Client-facing message
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials => "Invalid email or password",
            AuthFailure::MissingToken => "Refresh token is missing",
            AuthFailure::TokenNotFound => "Refresh token not found",
            AuthFailure::SessionInvalidated => "Session invalidated, please log in again",
            AuthFailure::TokenExpired => "Refresh token expired, please log in again",
        }
    }
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Credentials or refresh token rejected
    #[error("{0}")]
    AuthFailed(AuthFailure),

    /// Access token failed verification
    #[error(transparent)]
    AccessToken(#[from] JwtError),

    /// Malformed input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource already exists
    #[error("{0}")]
    Conflict(String),

    /// Resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Persistence, hashing or signing failure. Never shown verbatim to clients.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthFailure> for SessionError {
    fn from(reason: AuthFailure) -> Self {
        SessionError::AuthFailed(reason)
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => SessionError::Conflict(format!("Duplicate {}", field)),
            StoreError::Database(e) => SessionError::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for SessionError {
    fn from(err: PasswordError) -> Self {
        SessionError::Internal(err.to_string())
    }
}

/// Result alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failed_displays_generic_message() {
        let err = SessionError::from(AuthFailure::InvalidCredentials);
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err = SessionError::from(StoreError::Duplicate("email".to_string()));
        assert!(matches!(err, SessionError::Conflict(_)));
    }

    #[test]
    fn test_jwt_error_is_wrapped() {
        let err = SessionError::from(JwtError::Expired);
        assert!(matches!(err, SessionError::AccessToken(JwtError::Expired)));
        assert_eq!(err.to_string(), "Token has expired");
    }
}
