//! Error types for exam-core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised while building an exam session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no questions available for this exam")]
    NoQuestions,

    #[error("time limit must be at least one minute")]
    InvalidTimeLimit,
}
