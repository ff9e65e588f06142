//! Core exam library shared by the StudyDesk backend.
//!
//! This library provides:
//! - Timed exam session state machine (navigation, answer sheet, countdown,
//!   submission)
//! - Results scorer with a per-question breakdown
//! - Question pooling rules for exam assembly
//! - Shared types used across the platform

pub mod error;
pub mod pool;
pub mod scoring;
pub mod session;
pub mod types;

pub use error::{Result, SessionError};
pub use pool::{assemble_pool, needs_generation, EXAM_SIZE, MIN_POOL_SIZE};
pub use scoring::{is_correct, percentage, score_answers};
pub use session::{format_clock, ExamSession, TickOutcome};
pub use types::{AnswerOutcome, ExamResult, Question, QuestionReview, SessionStatus};
