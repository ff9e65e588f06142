//! Exam prediction endpoints.
//!
//! Two surfaces: the stored question pool (the study/review view, which
//! unlike the exam view includes correct answers) and a readiness
//! report computed from past attempts.

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthedUser;
use crate::services::predictions::{predict, Prediction};
use crate::services::sourcing::ORIGIN_GENERATED;
use crate::AppState;

/// GET /api/predictions?course=
/// Readiness report from this course's exam history
pub async fn readiness(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<Prediction>> {
    let attempts = state
        .db
        .get_attempts(auth.user_id, Some(&query.course))
        .await?;

    Ok(Json(predict(&query.course, &attempts)))
}

/// GET /api/predictions/questions?course=
/// The stored question pool, correct answers included
pub async fn questions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<QuestionPoolResponse>> {
    let questions = state
        .db
        .get_questions_by_course(auth.user_id, &query.course)
        .await?;

    Ok(Json(QuestionPoolResponse {
        course: query.course,
        questions: questions.into_iter().map(StudyQuestionView::from).collect(),
    }))
}

/// POST /api/predictions/generate
/// Forces a fresh AI batch into the pool
pub async fn generate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Json(payload): Json<GeneratePredictionsRequest>,
) -> Result<Json<QuestionPoolResponse>> {
    let count = payload.count.unwrap_or(exam_core::EXAM_SIZE);

    let material_refs = state
        .db
        .ready_material_keys(auth.user_id, &payload.course)
        .await?;
    let batch = state
        .ai
        .generate_questions(&payload.course, &material_refs, count)
        .await
        .map_err(|e| ApiError::Upstream(format!("Question generation failed: {}", e)))?;

    let rows: Vec<DbQuestion> = batch
        .into_iter()
        .filter(|q| q.is_well_formed())
        .map(|q| {
            DbQuestion::from_generated(auth.user_id, &payload.course, None, ORIGIN_GENERATED, q)
        })
        .collect();

    if rows.is_empty() {
        return Err(ApiError::Upstream(
            "Question generation returned no usable questions".to_string(),
        ));
    }

    state.db.insert_questions(&rows).await?;
    tracing::info!(
        "generated {} questions for course {}",
        rows.len(),
        payload.course
    );

    Ok(Json(QuestionPoolResponse {
        course: payload.course,
        questions: rows.into_iter().map(StudyQuestionView::from).collect(),
    }))
}
