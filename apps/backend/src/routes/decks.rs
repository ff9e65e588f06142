//! Flashcard deck endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthedUser;
use crate::AppState;

/// POST /api/decks
/// Creates an empty deck
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Json(payload): Json<CreateDeckRequest>,
) -> Result<Json<DbDeck>> {
    let deck = state
        .db
        .create_deck(auth.user_id, &payload.course, &payload.name)
        .await?;

    Ok(Json(deck))
}

/// POST /api/decks/generate
/// Builds a deck of AI-generated flashcards from a ready material
pub async fn generate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Json(payload): Json<GenerateDeckRequest>,
) -> Result<Json<DeckDetailResponse>> {
    let material = state
        .db
        .get_material(auth.user_id, payload.material_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;

    if material.status != MaterialStatus::Ready.as_str() {
        return Err(ApiError::BadRequest(format!(
            "Material is not ready for flashcard generation (status: {})",
            material.status
        )));
    }

    let bytes = state
        .storage
        .download_file(&material.s3_key)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let text = String::from_utf8_lossy(&bytes);

    let cards = state
        .ai
        .generate_flashcards(&material.course, &text)
        .await
        .map_err(|e| ApiError::Upstream(format!("Flashcard generation failed: {}", e)))?;

    if cards.is_empty() {
        return Err(ApiError::Upstream(
            "Flashcard generation returned no cards".to_string(),
        ));
    }

    let name = payload.name.unwrap_or_else(|| material.title.clone());
    let deck = state
        .db
        .create_deck(auth.user_id, &material.course, &name)
        .await?;

    let mut stored = Vec::with_capacity(cards.len());
    for card in cards {
        stored.push(
            state
                .db
                .insert_flashcard(deck.id, &card.front, &card.back)
                .await?,
        );
    }

    tracing::info!("deck {} generated with {} cards", deck.id, stored.len());
    Ok(Json(DeckDetailResponse { deck, cards: stored }))
}

/// GET /api/decks
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Query(query): Query<DeckListQuery>,
) -> Result<Json<DeckListResponse>> {
    let decks = state
        .db
        .get_decks(auth.user_id, query.course.as_deref())
        .await?;
    Ok(Json(DeckListResponse { decks }))
}

/// GET /api/decks/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(deck_id): Path<Uuid>,
) -> Result<Json<DeckDetailResponse>> {
    let deck = state
        .db
        .get_deck(auth.user_id, deck_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Deck not found".to_string()))?;

    let cards = state.db.get_flashcards(deck.id).await?;
    Ok(Json(DeckDetailResponse { deck, cards }))
}

/// POST /api/decks/{id}/cards
/// Adds a hand-written card to an existing deck
pub async fn add_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(deck_id): Path<Uuid>,
    Json(payload): Json<AddFlashcardRequest>,
) -> Result<Json<DbFlashcard>> {
    let deck = state
        .db
        .get_deck(auth.user_id, deck_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Deck not found".to_string()))?;

    let card = state
        .db
        .insert_flashcard(deck.id, &payload.front, &payload.back)
        .await?;
    Ok(Json(card))
}

/// DELETE /api/decks/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(deck_id): Path<Uuid>,
) -> Result<StatusCode> {
    let deleted = state.db.delete_deck(auth.user_id, deck_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Deck not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
