/// Bearer-token authentication
///
/// Reads `Authorization: Bearer <access token>`, resolves it through
/// [`SessionCore::authenticate`](tasktracker_shared::session::SessionCore::authenticate)
/// and inserts an [`AuthContext`] into the request extensions. Handlers
/// behind this layer take `Extension<AuthContext>`; resource endpoints
/// authorize by comparing `user_id` with the resource owner.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// Identity of the caller of an authenticated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    /// Owner id used for resource authorization
    pub user_id: Uuid,

    pub email: String,
}

/// Extracts the token from an `Authorization` header value
fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// JWT authentication middleware layer
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let user = state.session.authenticate(token).await?;

    req.extensions_mut().insert(AuthContext {
        user_id: user.id,
        email: user.email,
    });

    Ok(next.run(req).await)
}
