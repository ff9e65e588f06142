//! Course material endpoints.
//!
//! Uploads are stored in S3 with a row in the materials table; question
//! extraction runs in a spawned task and clients poll the material's
//! status until it reaches `ready` or `failed`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthedUser;
use crate::services::processing::{hash_content, process_material};
use crate::services::storage::StorageService;
use crate::AppState;

/// POST /api/materials
/// Uploads material text and kicks off question extraction
pub async fn upload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Json(payload): Json<UploadMaterialRequest>,
) -> Result<Json<MaterialView>> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Material content is empty".to_string()));
    }

    let content_hash = hash_content(&payload.content);

    // Identical re-upload within a course returns the existing row
    if let Some(existing) = state
        .db
        .find_material_by_hash(auth.user_id, &payload.course, &content_hash)
        .await?
    {
        tracing::info!("material upload matched existing {}", existing.id);
        return Ok(Json(existing.into()));
    }

    let material_id = Uuid::new_v4();
    let s3_key = StorageService::make_key(
        &auth.user_id.to_string(),
        &format!("{}/{}", material_id, payload.file_name),
    );

    state
        .storage
        .upload_file(&s3_key, payload.content.as_bytes(), Some("text/plain"))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let material = DbMaterial {
        id: material_id,
        user_id: auth.user_id,
        course: payload.course.clone(),
        title: payload.title,
        file_name: payload.file_name,
        s3_key,
        content_hash,
        status: MaterialStatus::Pending.as_str().to_string(),
        error: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    state.db.insert_material(&material).await?;

    tokio::spawn(process_material(
        state.clone(),
        material_id,
        auth.user_id,
        payload.course,
        payload.content,
    ));

    Ok(Json(material.into()))
}

/// GET /api/materials
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Query(query): Query<MaterialListQuery>,
) -> Result<Json<MaterialListResponse>> {
    let materials = state
        .db
        .get_materials(auth.user_id, query.course.as_deref())
        .await?;

    Ok(Json(MaterialListResponse {
        materials: materials.into_iter().map(MaterialView::from).collect(),
    }))
}

/// GET /api/materials/{id}
/// Polled by clients while extraction is running
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(material_id): Path<Uuid>,
) -> Result<Json<MaterialView>> {
    let material = state
        .db
        .get_material(auth.user_id, material_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;

    Ok(Json(material.into()))
}

/// DELETE /api/materials/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(material_id): Path<Uuid>,
) -> Result<StatusCode> {
    let material = state
        .db
        .get_material(auth.user_id, material_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;

    if let Err(e) = state.storage.delete_file(&material.s3_key).await {
        // Row deletion still proceeds; the object becomes unreferenced.
        tracing::warn!("failed to delete S3 object {}: {}", material.s3_key, e);
    }

    state.db.delete_material(auth.user_id, material_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
