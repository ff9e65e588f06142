//! AI tutor chat endpoints

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthedUser;
use crate::services::ai::TutorTurn;
use crate::AppState;

/// Prior turns relayed to the tutor endpoint with each message.
const HISTORY_WINDOW: i64 = 20;

const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// POST /api/tutor/chat
/// Relays the message with recent history; stores both turns
pub async fn chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Json(payload): Json<TutorSendRequest>,
) -> Result<Json<TutorReplyResponse>> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is empty".to_string()));
    }

    let history: Vec<TutorTurn> = state
        .db
        .get_tutor_messages(auth.user_id, &payload.course, HISTORY_WINDOW)
        .await?
        .into_iter()
        .map(|m| TutorTurn {
            role: m.role,
            content: m.content,
        })
        .collect();

    let reply = state
        .ai
        .tutor_reply(&payload.course, &history, &payload.message)
        .await
        .map_err(|e| ApiError::Upstream(format!("Tutor reply failed: {}", e)))?;

    // Both turns land only once the exchange succeeded, so a failed
    // relay leaves no half-conversation behind.
    state
        .db
        .insert_tutor_message(auth.user_id, &payload.course, "user", &payload.message)
        .await?;
    state
        .db
        .insert_tutor_message(auth.user_id, &payload.course, "assistant", &reply)
        .await?;

    Ok(Json(TutorReplyResponse { reply }))
}

/// GET /api/tutor/history?course=
pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Query(query): Query<TutorHistoryQuery>,
) -> Result<Json<TutorHistoryResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let messages = state
        .db
        .get_tutor_messages(auth.user_id, &query.course, limit)
        .await?;

    Ok(Json(TutorHistoryResponse {
        messages: messages.into_iter().map(TutorMessageView::from).collect(),
    }))
}
