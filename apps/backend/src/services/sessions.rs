//! In-memory registry of running exam sessions.
//!
//! Each started exam lives in the registry under a fresh id, together
//! with a countdown task that advances the session clock once per tick.
//! The tick that reaches zero auto-submits inside the engine. Once a
//! session is frozen the task keeps the entry around for a retention
//! window, long enough for clients to fetch the result or retake, and
//! then evicts it so the map never accumulates finished exams. All
//! access goes through short closure-scoped critical sections so the
//! lock is never held across an await point.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use exam_core::{ExamSession, TickOutcome};

/// A session plus the bookkeeping the engine itself does not carry.
pub struct ActiveExam {
    pub user_id: Uuid,
    pub course: String,
    pub session: ExamSession,
    /// Set once the scored result has been written to exam history.
    pub persisted: bool,
    /// Set by the countdown task when expiry froze the session.
    pub auto_submitted: bool,
}

/// Registry of running exams, shared across request handlers.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, ActiveExam>>,
    tick_interval: Duration,
    retention: Duration,
}

impl SessionRegistry {
    /// Create a registry whose countdown tasks tick at `tick_interval`
    /// and keep frozen sessions readable for `retention` before
    /// evicting them. Production uses a one-second tick and a retention
    /// of minutes; tests shorten both.
    pub fn new(tick_interval: Duration, retention: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            tick_interval,
            retention,
        })
    }

    /// Register a started session and spawn its countdown. Returns the
    /// session id handed to the client.
    pub async fn start_exam(
        self: Arc<Self>,
        user_id: Uuid,
        course: String,
        session: ExamSession,
    ) -> Uuid {
        let id = Uuid::new_v4();
        {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(
                id,
                ActiveExam {
                    user_id,
                    course,
                    session,
                    persisted: false,
                    auto_submitted: false,
                },
            );
        }
        tracing::info!("exam session {} started", id);
        Self::spawn_countdown(self, id);
        id
    }

    /// Read the session under the lock. Returns None for unknown ids and
    /// for sessions owned by a different user.
    pub async fn view<T>(
        &self,
        id: Uuid,
        user_id: Uuid,
        f: impl FnOnce(&ActiveExam) -> T,
    ) -> Option<T> {
        let sessions = self.sessions.lock().await;
        match sessions.get(&id) {
            Some(exam) if exam.user_id == user_id => Some(f(exam)),
            _ => None,
        }
    }

    /// Mutate the session under the lock. Same visibility rules as `view`.
    pub async fn update<T>(
        &self,
        id: Uuid,
        user_id: Uuid,
        f: impl FnOnce(&mut ActiveExam) -> T,
    ) -> Option<T> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&id) {
            Some(exam) if exam.user_id == user_id => Some(f(exam)),
            _ => None,
        }
    }

    /// Drop the session. Its countdown task exits on the next tick.
    pub async fn remove(&self, id: Uuid, user_id: Uuid) -> Option<ActiveExam> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&id) {
            Some(exam) if exam.user_id == user_id => sessions.remove(&id),
            _ => None,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn spawn_countdown(registry: Arc<Self>, id: Uuid) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(registry.tick_interval);
            // The first interval tick completes immediately; consume it so
            // the clock only starts moving one full tick after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                let outcome = {
                    let mut sessions = registry.sessions.lock().await;
                    match sessions.get_mut(&id) {
                        Some(exam) => {
                            let outcome = exam.session.tick();
                            if outcome == TickOutcome::Expired {
                                exam.auto_submitted = true;
                            }
                            Some(outcome)
                        }
                        None => None,
                    }
                };
                match outcome {
                    Some(TickOutcome::Running(_)) => {}
                    Some(TickOutcome::Expired) => {
                        tracing::info!("exam session {} ran out of time, auto-submitted", id);
                        break;
                    }
                    Some(TickOutcome::AlreadySubmitted) => break,
                    None => return,
                }
            }
            // Frozen. Leave the entry readable for the retention window,
            // then take it out of the map.
            tokio::time::sleep(registry.retention).await;
            let mut sessions = registry.sessions.lock().await;
            if let Some(exam) = sessions.remove(&id) {
                if exam.persisted {
                    tracing::info!("exam session {} evicted after retention", id);
                } else {
                    tracing::warn!("exam session {} evicted with its result never fetched", id);
                }
            }
        });
    }
}
