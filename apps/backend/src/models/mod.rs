//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from exam-core
pub use exam_core::types::{AnswerOutcome, ExamResult, Question, QuestionReview, SessionStatus};

use crate::services::ai::GeneratedQuestion;

// === Database Entity Types ===

/// Registered account info
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Lifecycle of an uploaded course material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialStatus {
    Pending,
    Processing,
    Ready,
    Failed,
}

impl MaterialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Course material stored in PostgreSQL, with the file body in S3
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMaterial {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course: String,
    pub title: String,
    pub file_name: String,
    pub s3_key: String,
    pub content_hash: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Exam question stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuestion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course: String,
    pub material_id: Option<Uuid>,
    pub text: String,
    pub options: Json<Vec<String>>,
    pub correct_answer: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub confidence: Option<f64>,
    /// "uploaded" for questions extracted from materials, "generated" for AI top-ups
    pub origin: String,
    pub created_at: DateTime<Utc>,
}

impl DbQuestion {
    /// Build a stored question from an AI batch entry
    pub fn from_generated(
        user_id: Uuid,
        course: &str,
        material_id: Option<Uuid>,
        origin: &str,
        generated: GeneratedQuestion,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course: course.to_string(),
            material_id,
            text: generated.text,
            options: Json(generated.options),
            correct_answer: generated.correct_answer,
            topic: generated.topic,
            difficulty: generated.difficulty,
            confidence: generated.confidence,
            origin: origin.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Convert to the core exam question type
    pub fn to_core_question(&self) -> Question {
        Question {
            id: self.id.to_string(),
            text: self.text.clone(),
            options: self.options.0.clone(),
            correct_answer: self.correct_answer.clone(),
            topic: self.topic.clone(),
            difficulty: self.difficulty.clone(),
            confidence: self.confidence,
        }
    }
}

/// Persisted record of a submitted exam
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbExamAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course: String,
    pub total_questions: i32,
    pub answered_count: i32,
    pub correct_count: i32,
    pub percentage: i32,
    pub time_spent_secs: i32,
    pub auto_submitted: bool,
    pub breakdown: Json<Vec<QuestionReview>>,
    pub submitted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl DbExamAttempt {
    /// Build an attempt row from a scored result. The session id doubles
    /// as the attempt id so an attempt is recorded at most once.
    pub fn from_result(
        session_id: Uuid,
        user_id: Uuid,
        course: String,
        auto_submitted: bool,
        result: &ExamResult,
    ) -> Self {
        Self {
            id: session_id,
            user_id,
            course,
            total_questions: result.total_questions as i32,
            answered_count: result.answered_count as i32,
            correct_count: result.correct_count as i32,
            percentage: result.percentage as i32,
            time_spent_secs: result.time_spent_secs as i32,
            auto_submitted,
            breakdown: Json(result.breakdown.clone()),
            submitted_at: result.submitted_at,
            created_at: Utc::now(),
        }
    }
}

/// Flashcard deck
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDeck {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flashcard within a deck
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbFlashcard {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One turn of the tutor conversation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTutorMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Deck info with card count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeckInfo {
    pub id: Uuid,
    pub course: String,
    pub name: String,
    pub card_count: i32,
    pub created_at: DateTime<Utc>,
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

// Exam types

#[derive(Debug, Serialize, Deserialize)]
pub struct StartExamRequest {
    pub course: String,
    pub time_limit_minutes: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub option: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GotoRequest {
    pub question: i64,
}

/// Candidate-facing view of the question on screen.
/// Never includes the correct answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExamQuestionView {
    pub position: usize,
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

/// Candidate-facing view of a running (or submitted) session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub course: String,
    pub status: SessionStatus,
    pub question_count: usize,
    pub current_index: usize,
    pub answered_count: usize,
    pub time_remaining_secs: u32,
    /// MM:SS rendering of the remaining time
    pub clock: String,
    pub question: ExamQuestionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExamResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitExamResponse {
    pub session_id: Uuid,
    pub auto_submitted: bool,
    pub result: ExamResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExamHistoryQuery {
    pub course: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptView {
    pub id: Uuid,
    pub course: String,
    pub total_questions: i32,
    pub answered_count: i32,
    pub correct_count: i32,
    pub percentage: i32,
    pub time_spent_secs: i32,
    pub auto_submitted: bool,
    pub submitted_at: DateTime<Utc>,
}

impl From<DbExamAttempt> for AttemptView {
    fn from(attempt: DbExamAttempt) -> Self {
        Self {
            id: attempt.id,
            course: attempt.course,
            total_questions: attempt.total_questions,
            answered_count: attempt.answered_count,
            correct_count: attempt.correct_count,
            percentage: attempt.percentage,
            time_spent_secs: attempt.time_spent_secs,
            auto_submitted: attempt.auto_submitted,
            submitted_at: attempt.submitted_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExamHistoryResponse {
    pub attempts: Vec<AttemptView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptDetailResponse {
    #[serde(flatten)]
    pub attempt: AttemptView,
    pub breakdown: Vec<QuestionReview>,
}

// Material types

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadMaterialRequest {
    pub course: String,
    pub title: String,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaterialView {
    pub id: Uuid,
    pub course: String,
    pub title: String,
    pub file_name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbMaterial> for MaterialView {
    fn from(material: DbMaterial) -> Self {
        Self {
            id: material.id,
            course: material.course,
            title: material.title,
            file_name: material.file_name,
            status: material.status,
            error: material.error,
            created_at: material.created_at,
            updated_at: material.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaterialListQuery {
    pub course: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaterialListResponse {
    pub materials: Vec<MaterialView>,
}

// Deck types

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckListQuery {
    pub course: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckListResponse {
    pub decks: Vec<DeckInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDeckRequest {
    pub course: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateDeckRequest {
    pub material_id: Uuid,
    /// Defaults to the material title.
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckDetailResponse {
    pub deck: DbDeck,
    pub cards: Vec<DbFlashcard>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddFlashcardRequest {
    pub front: String,
    pub back: String,
}

// Tutor types

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorHistoryQuery {
    pub course: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorMessageView {
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbTutorMessage> for TutorMessageView {
    fn from(message: DbTutorMessage) -> Self {
        Self {
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorHistoryResponse {
    pub messages: Vec<TutorMessageView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorSendRequest {
    pub course: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorReplyResponse {
    pub reply: String,
}

// Prediction types

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub course: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratePredictionsRequest {
    pub course: String,
    pub count: Option<usize>,
}

/// Study-surface view of a pooled question. Unlike the exam view this
/// one carries the correct answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct StudyQuestionView {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub origin: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbQuestion> for StudyQuestionView {
    fn from(question: DbQuestion) -> Self {
        Self {
            id: question.id,
            text: question.text,
            options: question.options.0,
            correct_answer: question.correct_answer,
            topic: question.topic,
            difficulty: question.difficulty,
            confidence: question.confidence,
            origin: question.origin,
            created_at: question.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionPoolResponse {
    pub course: String,
    pub questions: Vec<StudyQuestionView>,
}
