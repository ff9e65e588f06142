//! Material processing pipeline.
//!
//! Uploads land in S3 and a `pending` row in the materials table. A
//! background task then asks the AI service to extract questions from
//! the material text and moves the row to `ready`, or to `failed` with
//! the error recorded.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{DbQuestion, MaterialStatus};
use crate::AppState;

/// Origin recorded for questions extracted from uploaded material.
pub const ORIGIN_UPLOADED: &str = "uploaded";

/// Calculate SHA256 hash of content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Run extraction for one uploaded material. Spawned by the upload
/// handler; all failures end up on the material row, not the response.
pub async fn process_material(
    state: AppState,
    material_id: Uuid,
    user_id: Uuid,
    course: String,
    content: String,
) {
    if let Err(e) = state
        .db
        .update_material_status(material_id, MaterialStatus::Processing, None)
        .await
    {
        tracing::error!("material {}: failed to mark processing: {}", material_id, e);
        return;
    }

    match extract_and_store(&state, material_id, user_id, &course, &content).await {
        Ok(count) => {
            tracing::info!("material {}: extracted {} questions", material_id, count);
            if let Err(e) = state
                .db
                .update_material_status(material_id, MaterialStatus::Ready, None)
                .await
            {
                tracing::error!("material {}: failed to mark ready: {}", material_id, e);
            }
        }
        Err(message) => {
            tracing::error!("material {}: processing failed: {}", material_id, message);
            if let Err(e) = state
                .db
                .update_material_status(material_id, MaterialStatus::Failed, Some(&message))
                .await
            {
                tracing::error!("material {}: failed to mark failed: {}", material_id, e);
            }
        }
    }
}

async fn extract_and_store(
    state: &AppState,
    material_id: Uuid,
    user_id: Uuid,
    course: &str,
    content: &str,
) -> std::result::Result<usize, String> {
    let batch = state
        .ai
        .extract_questions(course, content)
        .await
        .map_err(|e| e.to_string())?;

    let mut rows = Vec::with_capacity(batch.len());
    for question in batch {
        if !question.is_well_formed() {
            tracing::warn!("material {}: discarding malformed question", material_id);
            continue;
        }
        rows.push(DbQuestion::from_generated(
            user_id,
            course,
            Some(material_id),
            ORIGIN_UPLOADED,
            question,
        ));
    }

    state
        .db
        .insert_questions(&rows)
        .await
        .map_err(|e| e.to_string())
}
