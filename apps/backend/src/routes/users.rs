//! User registration and status endpoints

use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::models::{RegisterRequest, RegisterResponse, UserResponse};
use crate::routes::auth::AuthedUser;
use crate::AppState;

/// POST /api/users/register
/// Creates a new user and returns the token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Option<RegisterRequest>>,
) -> Result<Json<RegisterResponse>> {
    let name = payload.and_then(|p| p.name);
    let user = state.db.create_user(name.as_deref()).await?;

    tracing::info!("Registered new user: {}", user.id);

    Ok(Json(RegisterResponse {
        user_id: user.id,
        token: user.token,
    }))
}

/// GET /api/users/status
/// Returns the authenticated user's account info
pub async fn status(
    Extension(auth): Extension<AuthedUser>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| crate::error::ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        user_id: user.id,
        name: user.name,
        created_at: user.created_at,
        last_seen_at: user.last_seen_at,
    }))
}
