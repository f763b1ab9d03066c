/// Authentication endpoints
///
/// This module binds the session core to HTTP:
/// - Registration
/// - Login
/// - Token refresh
/// - Logout
/// - Current identity
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register new user
/// - `POST /api/v1/auth/login` - Login, sets the refresh cookie
/// - `POST /api/v1/auth/refresh` - Rotate the refresh cookie, new access token
/// - `POST /api/v1/auth/logout` - Revoke all sessions, clears the refresh cookie
/// - `GET /api/v1/auth/me` - Identity behind the bearer token

use crate::{
    app::AppState,
    cookie::read_refresh_token,
    error::{ApiError, ApiResult},
    middleware::AuthContext,
    response::ApiResponse,
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tasktracker_shared::session::{AuthFailure, SessionError, SessionTokens};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registered user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

/// Login and refresh payload
///
/// The refresh token is deliberately absent: it only travels in the cookie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Access token for the `Authorization: Bearer` header
    pub token: String,

    pub email: String,

    pub user_id: Uuid,
}

impl From<&SessionTokens> for AuthResponse {
    fn from(tokens: &SessionTokens) -> Self {
        Self {
            token: tokens.access_token.clone(),
            email: tokens.email.clone(),
            user_id: tokens.user_id,
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "data": { "id": "uuid", "email": "user@example.com" },
///   "message": "User registered successfully",
///   "statusCode": 201
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already in use
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<ApiResponse<UserResponse>> {
    req.validate()?;

    let user = state.session.register(&req.email, &req.password).await?;

    Ok(ApiResponse::created(
        UserResponse {
            id: user.id,
            email: user.email,
        },
        "User registered successfully",
    ))
}

/// Login with email and password
///
/// On success the access token is returned in the body and the refresh
/// token is set as an `HttpOnly` cookie.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: "Invalid email or password", for unknown email and wrong password alike
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let tokens = state.session.login(&req.email, &req.password).await?;
    let cookie = state.cookies.set(&tokens.refresh_token)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(AuthResponse::from(&tokens), "Login successful"),
    )
        .into_response())
}

/// Rotate the refresh token
///
/// Reads the `refreshToken` cookie, and on success replaces it with the
/// rotated token. When the token is rejected the cookie is cleared, since
/// it can never succeed again.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing, unknown, expired or replayed refresh token
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let presented = read_refresh_token(&headers)
        .ok_or(SessionError::AuthFailed(AuthFailure::MissingToken))?;

    match state.session.refresh(&presented).await {
        Ok(tokens) => {
            let cookie = state.cookies.set(&tokens.refresh_token)?;

            Ok((
                [(header::SET_COOKIE, cookie)],
                ApiResponse::ok(AuthResponse::from(&tokens), "Token refreshed successfully"),
            )
                .into_response())
        }
        Err(err @ SessionError::AuthFailed(_)) => {
            let cookie = state.cookies.clear()?;
            Ok(([(header::SET_COOKIE, cookie)], ApiError::from(err)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Log out
///
/// Revokes every refresh token of the cookie's owner and clears the
/// cookie. Succeeds even without a cookie or with an unknown token.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(presented) = read_refresh_token(&headers) {
        state.session.logout(&presented).await?;
    }

    let cookie = state.cookies.clear()?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok((), "Logged out successfully"),
    )
        .into_response())
}

/// Current identity
///
/// Requires `Authorization: Bearer <access token>`.
pub async fn me(Extension(auth): Extension<AuthContext>) -> ApiResponse<AuthContext> {
    ApiResponse::ok(auth, "Authenticated")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            email: "user@example.com".to_string(),
            password: "long enough".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_auth_response_shape() {
        let tokens = SessionTokens {
            access_token: "eyJ...".to_string(),
            refresh_token: "secret".to_string(),
            user_id: Uuid::nil(),
            email: "user@example.com".to_string(),
        };

        let json = serde_json::to_value(AuthResponse::from(&tokens)).unwrap();
        assert_eq!(json["token"], "eyJ...");
        assert_eq!(json["email"], "user@example.com");
        assert!(json.get("userId").is_some());
        assert!(json.get("refreshToken").is_none());
    }
}
