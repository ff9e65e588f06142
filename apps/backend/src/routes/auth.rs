//! Authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::AppState;

/// How requests resolve to a user. Bound once at startup; handler and
/// engine logic never branch on it.
#[derive(Clone, Debug)]
pub enum AuthMode {
    /// Look the user up by bearer token (production).
    Token,
    /// Every request resolves to this fixed user (development).
    DevUser(Uuid),
}

/// Authenticated user info stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthedUser {
    pub user_id: Uuid,
}

/// Auth middleware - resolves the request to a user per the bound mode
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    // Skip auth for register endpoint and health check
    let path = request.uri().path();
    if path == "/api/users/register" || path == "/health" {
        return Ok(next.run(request).await);
    }

    let user_id = match &state.auth {
        AuthMode::DevUser(user_id) => *user_id,
        AuthMode::Token => {
            // Extract Bearer token
            let auth_header = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    ApiError::Unauthorized("Missing Authorization header".to_string())
                })?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?;

            let user = state
                .db
                .get_user_by_token(token)
                .await?
                .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;
            user.id
        }
    };

    // Update last_seen
    state.db.update_last_seen(user_id).await?;

    // Store authenticated user in request extensions
    request.extensions_mut().insert(AuthedUser { user_id });

    Ok(next.run(request).await)
}
