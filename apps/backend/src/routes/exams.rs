//! Exam session endpoints.
//!
//! Sessions live in the in-memory registry while in progress; a scored
//! attempt is written to exam history exactly once after the freeze,
//! whether submission was manual or the countdown expired.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use exam_core::{format_clock, ExamSession};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthedUser;
use crate::services::sessions::ActiveExam;
use crate::services::sourcing::source_exam_questions;
use crate::AppState;

/// Countdown used when the client does not pick one.
const DEFAULT_TIME_LIMIT_MINUTES: u32 = 45;

fn session_view(session_id: Uuid, exam: &ActiveExam) -> SessionView {
    let session = &exam.session;
    let question = session.current_question();
    SessionView {
        session_id,
        course: exam.course.clone(),
        status: session.status(),
        question_count: session.question_count(),
        current_index: session.current_index(),
        answered_count: session.answered_count(),
        time_remaining_secs: session.time_remaining_secs(),
        clock: format_clock(session.time_remaining_secs()),
        question: ExamQuestionView {
            position: session.current_index(),
            id: question.id.clone(),
            text: question.text.clone(),
            options: question.options.clone(),
            topic: question.topic.clone(),
            selected: session.current_selection().map(str::to_string),
        },
        result: session.result().cloned(),
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Exam session not found".to_string())
}

/// Write the scored attempt to history if this is the first route to
/// see the frozen session. The flag flips inside the registry lock, so
/// concurrent callers cannot both insert.
async fn persist_attempt(state: &AppState, session_id: Uuid, user_id: Uuid) -> Result<()> {
    let row = state
        .sessions
        .update(session_id, user_id, |exam| {
            match exam.session.result() {
                Some(result) if !exam.persisted => {
                    exam.persisted = true;
                    Some(DbExamAttempt::from_result(
                        session_id,
                        user_id,
                        exam.course.clone(),
                        exam.auto_submitted,
                        result,
                    ))
                }
                _ => None,
            }
        })
        .await
        .ok_or_else(not_found)?;

    if let Some(attempt) = row {
        state.db.insert_attempt(&attempt).await?;
        tracing::info!(
            "exam session {} recorded: {}/{} correct",
            session_id,
            attempt.correct_count,
            attempt.total_questions
        );
    }
    Ok(())
}

/// POST /api/exams/start
/// Sources a question pool and opens a timed session over it
pub async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Json(payload): Json<StartExamRequest>,
) -> Result<Json<SessionView>> {
    let questions =
        source_exam_questions(&state.db, state.ai.as_ref(), auth.user_id, &payload.course).await?;

    let minutes = payload
        .time_limit_minutes
        .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES);
    let session = ExamSession::start(questions, minutes)?;

    let session_id = state
        .sessions
        .clone()
        .start_exam(auth.user_id, payload.course, session)
        .await;

    let view = state
        .sessions
        .view(session_id, auth.user_id, |exam| session_view(session_id, exam))
        .await
        .ok_or_else(not_found)?;

    Ok(Json(view))
}

/// GET /api/exams/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let view = state
        .sessions
        .view(session_id, auth.user_id, |exam| session_view(session_id, exam))
        .await
        .ok_or_else(not_found)?;
    Ok(Json(view))
}

/// POST /api/exams/{id}/answer
/// Records (or replaces) the answer to the question on screen
pub async fn answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<SessionView>> {
    let view = state
        .sessions
        .update(session_id, auth.user_id, |exam| {
            if !exam
                .session
                .current_question()
                .options
                .contains(&payload.option)
            {
                return Err(ApiError::BadRequest(
                    "Selected option is not among this question's choices".to_string(),
                ));
            }
            exam.session.select_answer(payload.option.clone());
            Ok(session_view(session_id, exam))
        })
        .await
        .ok_or_else(not_found)??;

    Ok(Json(view))
}

/// POST /api/exams/{id}/goto
/// Jumps to a question; out-of-range targets clamp to the ends
pub async fn goto(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<GotoRequest>,
) -> Result<Json<SessionView>> {
    let target = payload.question.max(1) as usize;
    let view = state
        .sessions
        .update(session_id, auth.user_id, |exam| {
            exam.session.go_to(target);
            session_view(session_id, exam)
        })
        .await
        .ok_or_else(not_found)?;
    Ok(Json(view))
}

/// POST /api/exams/{id}/next
pub async fn next_question(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let view = state
        .sessions
        .update(session_id, auth.user_id, |exam| {
            exam.session.next();
            session_view(session_id, exam)
        })
        .await
        .ok_or_else(not_found)?;
    Ok(Json(view))
}

/// POST /api/exams/{id}/previous
pub async fn previous_question(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let view = state
        .sessions
        .update(session_id, auth.user_id, |exam| {
            exam.session.previous();
            session_view(session_id, exam)
        })
        .await
        .ok_or_else(not_found)?;
    Ok(Json(view))
}

/// POST /api/exams/{id}/submit
/// Freezes and scores the session; repeat calls return the same result
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SubmitExamResponse>> {
    let (result, auto_submitted) = state
        .sessions
        .update(session_id, auth.user_id, |exam| {
            (exam.session.submit(), exam.auto_submitted)
        })
        .await
        .ok_or_else(not_found)?;

    persist_attempt(&state, session_id, auth.user_id).await?;

    Ok(Json(SubmitExamResponse {
        session_id,
        auto_submitted,
        result,
    }))
}

/// GET /api/exams/{id}/result
/// The scored report for a submitted session
pub async fn result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SubmitExamResponse>> {
    let frozen = state
        .sessions
        .view(session_id, auth.user_id, |exam| {
            exam.session
                .result()
                .cloned()
                .map(|result| (result, exam.auto_submitted))
        })
        .await
        .ok_or_else(not_found)?;

    let (result, auto_submitted) = frozen.ok_or_else(|| {
        ApiError::BadRequest("Exam has not been submitted yet".to_string())
    })?;

    // An auto-submitted session may reach history through this route
    // rather than submit.
    persist_attempt(&state, session_id, auth.user_id).await?;

    Ok(Json(SubmitExamResponse {
        session_id,
        auto_submitted,
        result,
    }))
}

/// POST /api/exams/{id}/retake
/// Opens a brand-new session over the same question list
pub async fn retake(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let (questions, minutes, course) = state
        .sessions
        .view(session_id, auth.user_id, |exam| {
            (
                exam.session.questions().to_vec(),
                (exam.session.time_limit_secs() / 60).max(1),
                exam.course.clone(),
            )
        })
        .await
        .ok_or_else(not_found)?;

    let session = ExamSession::start(questions, minutes)?;
    let new_id = state
        .sessions
        .clone()
        .start_exam(auth.user_id, course, session)
        .await;

    let view = state
        .sessions
        .view(new_id, auth.user_id, |exam| session_view(new_id, exam))
        .await
        .ok_or_else(not_found)?;

    Ok(Json(view))
}

/// DELETE /api/exams/{id}
/// Abandons the session: dropped without scoring or persistence
pub async fn abandon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .sessions
        .remove(session_id, auth.user_id)
        .await
        .ok_or_else(not_found)?;

    tracing::info!("exam session {} abandoned", session_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/exams/history
pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Query(query): Query<ExamHistoryQuery>,
) -> Result<Json<ExamHistoryResponse>> {
    let attempts = state
        .db
        .get_attempts(auth.user_id, query.course.as_deref())
        .await?;

    Ok(Json(ExamHistoryResponse {
        attempts: attempts.into_iter().map(AttemptView::from).collect(),
    }))
}

/// GET /api/exams/history/{id}
/// One past attempt with its per-question breakdown
pub async fn attempt_detail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthedUser>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Json<AttemptDetailResponse>> {
    let attempt = state
        .db
        .get_attempt(auth.user_id, attempt_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Exam attempt not found".to_string()))?;

    let breakdown = attempt.breakdown.0.clone();
    Ok(Json(AttemptDetailResponse {
        attempt: AttemptView::from(attempt),
        breakdown,
    }))
}
