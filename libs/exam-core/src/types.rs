//! Core types for the exam engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single multiple-choice question. Immutable once sourced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, unique within an exam session.
    pub id: String,
    /// Prompt text.
    pub text: String,
    /// Ordered answer choices; never empty.
    pub options: Vec<String>,
    /// The designated correct choice, as full option text.
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Question {
    /// Build a question without metadata.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            options,
            correct_answer: correct_answer.into(),
            topic: None,
            difficulty: None,
            confidence: None,
        }
    }
}

/// Lifecycle of one exam attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Submitted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
        }
    }
}

/// How a single question ended up after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Unanswered,
    Correct,
    Incorrect,
}

/// Per-question entry in a scored report, in original question order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionReview {
    /// 1-based position within the exam.
    pub position: usize,
    pub question_id: String,
    pub outcome: AnswerOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    /// Recorded for display on the review screen.
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl QuestionReview {
    pub fn is_correct(&self) -> bool {
        self.outcome == AnswerOutcome::Correct
    }
}

/// Immutable report derived from a submitted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub total_questions: usize,
    pub answered_count: usize,
    pub correct_count: usize,
    /// Rounded percent in [0, 100]; 0 for an empty exam.
    pub percentage: u32,
    pub time_spent_secs: u32,
    pub submitted_at: DateTime<Utc>,
    pub breakdown: Vec<QuestionReview>,
}
