//! Timed exam session state machine.
//!
//! A session owns its question list, the candidate's answer sheet, a
//! countdown, and a cursor over the questions. All transitions go through
//! `&mut self` methods; once the session freezes (manual submit or the
//! countdown hitting zero) every mutating call becomes a no-op and the
//! scored result is served from a cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::scoring;
use crate::types::{ExamResult, Question, SessionStatus};

/// Outcome of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Countdown still running; seconds remaining after the tick.
    Running(u32),
    /// This tick reached zero and froze the session.
    Expired,
    /// The session was already frozen; nothing changed.
    AlreadySubmitted,
}

/// One candidate's in-flight exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
    questions: Vec<Question>,
    /// 1-based cursor, always within [1, questions.len()].
    current_index: usize,
    /// Answer sheet keyed by 1-based question position.
    answers: BTreeMap<usize, String>,
    time_limit_secs: u32,
    time_remaining_secs: u32,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    /// Scored exactly once, at freeze. Present iff status is Submitted.
    result: Option<ExamResult>,
}

impl ExamSession {
    /// Start a session over `questions` with a countdown of
    /// `time_limit_minutes`.
    pub fn start(questions: Vec<Question>, time_limit_minutes: u32) -> Result<Self> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        if time_limit_minutes == 0 {
            return Err(SessionError::InvalidTimeLimit);
        }
        let time_limit_secs = time_limit_minutes.saturating_mul(60);
        Ok(Self {
            questions,
            current_index: 1,
            answers: BTreeMap::new(),
            time_limit_secs,
            time_remaining_secs: time_limit_secs,
            status: SessionStatus::InProgress,
            started_at: Utc::now(),
            result: None,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// 1-based position of the question on screen.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index - 1]
    }

    /// The recorded answer for the current question, recomputed from the
    /// answer sheet on every call rather than carried as separate state.
    pub fn current_selection(&self) -> Option<&str> {
        self.answers.get(&self.current_index).map(String::as_str)
    }

    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_secs
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_submitted(&self) -> bool {
        self.status == SessionStatus::Submitted
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The scored result, present once the session has frozen.
    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    /// Record `option` as the answer to the current question, replacing
    /// any earlier choice. Ignored after submission.
    pub fn select_answer(&mut self, option: impl Into<String>) {
        if self.is_submitted() {
            return;
        }
        self.answers.insert(self.current_index, option.into());
    }

    /// Jump to `question_number`, clamped into [1, question_count].
    /// Ignored after submission.
    pub fn go_to(&mut self, question_number: usize) {
        if self.is_submitted() {
            return;
        }
        self.current_index = question_number.clamp(1, self.questions.len());
    }

    /// Advance one question; saturates at the last question.
    pub fn next(&mut self) {
        self.go_to(self.current_index.saturating_add(1));
    }

    /// Step back one question; saturates at the first question.
    pub fn previous(&mut self) {
        self.go_to(self.current_index.saturating_sub(1));
    }

    /// Advance the countdown by one second. The tick that reaches zero
    /// freezes and scores the session; later ticks change nothing.
    pub fn tick(&mut self) -> TickOutcome {
        if self.is_submitted() {
            return TickOutcome::AlreadySubmitted;
        }
        self.time_remaining_secs = self.time_remaining_secs.saturating_sub(1);
        if self.time_remaining_secs == 0 {
            self.freeze();
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.time_remaining_secs)
        }
    }

    /// Submit the exam. The first call freezes and scores the session;
    /// every later call returns the same cached result.
    pub fn submit(&mut self) -> ExamResult {
        match self.result.clone() {
            Some(existing) => existing,
            None => self.freeze(),
        }
    }

    fn freeze(&mut self) -> ExamResult {
        self.status = SessionStatus::Submitted;
        let time_spent = self.time_limit_secs - self.time_remaining_secs;
        let result = scoring::score_answers(&self.questions, &self.answers, time_spent);
        self.result = Some(result.clone());
        result
    }
}

/// Render seconds as an MM:SS wall clock, e.g. 2700 -> "45:00".
pub fn format_clock(total_secs: u32) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
