//! Question sourcing for exam assembly.
//!
//! Stored questions for the course are loaded first. When fewer than
//! [`exam_core::MIN_POOL_SIZE`] exist, the AI service is asked once for
//! enough questions to fill an exam; the batch is persisted so later
//! exams reuse it instead of calling out again. Stored questions always
//! precede generated ones in the final pool.

use uuid::Uuid;

use exam_core::{assemble_pool, needs_generation, Question, EXAM_SIZE};

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::DbQuestion;
use crate::services::ai::AiService;

/// Origin recorded for AI top-up questions.
pub const ORIGIN_GENERATED: &str = "generated";

/// How many questions to request from the AI, if any.
pub fn generation_request_size(existing: usize) -> Option<usize> {
    if needs_generation(existing) {
        Some(EXAM_SIZE - existing)
    } else {
        None
    }
}

/// Assemble the question pool for a new exam in `course`.
pub async fn source_exam_questions(
    db: &Database,
    ai: &dyn AiService,
    user_id: Uuid,
    course: &str,
) -> Result<Vec<Question>> {
    let stored = db.get_questions_by_course(user_id, course).await?;
    let existing: Vec<Question> = stored.iter().map(DbQuestion::to_core_question).collect();

    let generated = match generation_request_size(existing.len()) {
        Some(count) => {
            tracing::info!(
                "course {} has {} stored questions, requesting {} generated",
                course,
                existing.len(),
                count
            );
            let material_refs = db.ready_material_keys(user_id, course).await?;
            let batch = ai
                .generate_questions(course, &material_refs, count)
                .await
                .map_err(|e| ApiError::Upstream(format!("Question generation failed: {}", e)))?;

            let mut rows = Vec::with_capacity(batch.len());
            for question in batch {
                if !question.is_well_formed() {
                    tracing::warn!("discarding malformed generated question for {}", course);
                    continue;
                }
                rows.push(DbQuestion::from_generated(
                    user_id,
                    course,
                    None,
                    ORIGIN_GENERATED,
                    question,
                ));
            }
            if rows.is_empty() && existing.is_empty() {
                return Err(ApiError::Upstream(
                    "Question generation returned no usable questions".to_string(),
                ));
            }
            db.insert_questions(&rows).await?;
            rows.iter().map(DbQuestion::to_core_question).collect()
        }
        None => Vec::new(),
    };

    Ok(assemble_pool(existing, generated, EXAM_SIZE))
}
