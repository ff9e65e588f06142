//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating test data
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require:
//! - PostgreSQL database (set DATABASE_URL env var)
//! - Optionally S3/R2 for material upload tests (set S3_* env vars)
//!
//! The AI functions service is always replaced by a scripted stub, so
//! no network access to real AI endpoints is ever needed.

pub mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use uuid::Uuid;

use studydesk_backend::db::Database;
use studydesk_backend::models::DbQuestion;
use studydesk_backend::routes::auth::AuthMode;
use studydesk_backend::services::ai::ScriptedAiService;
use studydesk_backend::services::sessions::SessionRegistry;
use studydesk_backend::services::storage::StorageService;
use studydesk_backend::{build_router, AppState};

/// Countdown tick used by test registries. Short enough that a
/// one-minute exam expires within a couple of seconds.
const TEST_TICK: Duration = Duration::from_millis(20);

/// Retention for finished sessions in test registries. Long enough
/// that no test loses a result it still wants to fetch; eviction
/// itself is covered by the registry's unit tests.
const TEST_RETENTION: Duration = Duration::from_secs(30);

/// Test context containing database connection and test server.
///
/// Use this to set up integration tests with a real database connection.
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context with real S3 storage.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        Self::build(false, false).await
    }

    /// Create a new test context with storage pointed at a dummy
    /// endpoint. Use this for tests that never touch S3; material
    /// upload will fail under it.
    pub async fn new_without_storage() -> Self {
        Self::build(true, false).await
    }

    /// Create a test context whose AI stub fails every call. For tests
    /// covering upstream-failure handling.
    pub async fn new_with_failing_ai() -> Self {
        Self::build(true, true).await
    }

    async fn build(dummy_storage: bool, failing_ai: bool) -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations().await.expect("Failed to run migrations");

        let db = Arc::new(db);

        if dummy_storage {
            std::env::set_var("S3_BUCKET", "test-bucket");
            std::env::set_var("S3_ACCESS_KEY", "test-key");
            std::env::set_var("S3_SECRET_KEY", "test-secret");
            std::env::set_var("S3_ENDPOINT", "http://localhost:9000");
        }

        let storage = StorageService::new()
            .await
            .expect("Failed to initialize storage (set S3_* env vars)");

        let ai = if failing_ai {
            ScriptedAiService::failing()
        } else {
            ScriptedAiService::new()
        };

        let state = AppState {
            db: db.clone(),
            storage: Arc::new(storage),
            ai: Arc::new(ai),
            sessions: SessionRegistry::new(TEST_TICK, TEST_RETENTION),
            auth: AuthMode::Token,
        };

        let app = build_router(state);

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test user and return its ID and token.
    pub async fn create_test_user(&self, name: Option<&str>) -> (Uuid, String) {
        let user = self
            .db
            .create_user(name)
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    /// Seed `count` stored questions for a course. Question `n` has
    /// "correct n" as its right answer.
    pub async fn seed_questions(&self, user_id: Uuid, course: &str, count: usize) -> Vec<DbQuestion> {
        let questions: Vec<DbQuestion> = (1..=count)
            .map(|n| fixtures::db_question(user_id, course, n))
            .collect();
        self.db
            .insert_questions(&questions)
            .await
            .expect("Failed to seed questions");
        questions
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Clean up test data for a user. Child rows cascade from the
    /// users row.
    pub async fn cleanup_user(&self, user_id: Uuid) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }
}
