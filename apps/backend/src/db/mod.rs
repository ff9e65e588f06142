//! PostgreSQL database operations

use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with generated token
    pub async fn create_user(&self, name: Option<&str>) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (token, name)
            VALUES ($1, $2)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Ensure a user row exists with the given id (dev auth mode)
    pub async fn ensure_user(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, token, name)
            VALUES ($1, $2, 'dev')
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Uuid::new_v4().to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by id
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Material Repository ===

    /// Insert a new material in pending state
    pub async fn insert_material(&self, material: &DbMaterial) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO materials (id, user_id, course, title, file_name, s3_key,
                                   content_hash, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(material.id)
        .bind(material.user_id)
        .bind(&material.course)
        .bind(&material.title)
        .bind(&material.file_name)
        .bind(&material.s3_key)
        .bind(&material.content_hash)
        .bind(&material.status)
        .bind(material.created_at)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get material by id, scoped to a user
    pub async fn get_material(&self, user_id: Uuid, material_id: Uuid) -> Result<Option<DbMaterial>> {
        let material = sqlx::query_as::<_, DbMaterial>(
            r#"
            SELECT id, user_id, course, title, file_name, s3_key, content_hash,
                   status, error, created_at, updated_at
            FROM materials
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(material_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(material)
    }

    /// Get all materials for a user, optionally filtered by course
    pub async fn get_materials(&self, user_id: Uuid, course: Option<&str>) -> Result<Vec<DbMaterial>> {
        let materials = match course {
            Some(course) => {
                sqlx::query_as::<_, DbMaterial>(
                    r#"
                    SELECT id, user_id, course, title, file_name, s3_key, content_hash,
                           status, error, created_at, updated_at
                    FROM materials
                    WHERE user_id = $1 AND course = $2
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id)
                .bind(course)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbMaterial>(
                    r#"
                    SELECT id, user_id, course, title, file_name, s3_key, content_hash,
                           status, error, created_at, updated_at
                    FROM materials
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(materials)
    }

    /// Find a material with identical content within a course
    pub async fn find_material_by_hash(
        &self,
        user_id: Uuid,
        course: &str,
        content_hash: &str,
    ) -> Result<Option<DbMaterial>> {
        let material = sqlx::query_as::<_, DbMaterial>(
            r#"
            SELECT id, user_id, course, title, file_name, s3_key, content_hash,
                   status, error, created_at, updated_at
            FROM materials
            WHERE user_id = $1 AND course = $2 AND content_hash = $3
            "#,
        )
        .bind(user_id)
        .bind(course)
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(material)
    }

    /// Storage keys of the course's ready materials, newest first.
    /// These ground AI question generation in the uploaded material.
    pub async fn ready_material_keys(&self, user_id: Uuid, course: &str) -> Result<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT s3_key
            FROM materials
            WHERE user_id = $1 AND course = $2 AND status = 'ready'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(course)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }

    /// Update material processing status
    pub async fn update_material_status(
        &self,
        material_id: Uuid,
        status: MaterialStatus,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE materials
            SET status = $2, error = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(material_id)
        .bind(status.as_str())
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a material and its extracted questions
    pub async fn delete_material(&self, user_id: Uuid, material_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM materials
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(material_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Question Repository ===

    /// Insert a batch of questions
    pub async fn insert_questions(&self, questions: &[DbQuestion]) -> Result<usize> {
        let mut count = 0;
        for question in questions {
            sqlx::query(
                r#"
                INSERT INTO questions (id, user_id, course, material_id, text, options,
                                       correct_answer, topic, difficulty, confidence,
                                       origin, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(question.id)
            .bind(question.user_id)
            .bind(&question.course)
            .bind(question.material_id)
            .bind(&question.text)
            .bind(&question.options)
            .bind(&question.correct_answer)
            .bind(&question.topic)
            .bind(&question.difficulty)
            .bind(question.confidence)
            .bind(&question.origin)
            .bind(question.created_at)
            .execute(&self.pool)
            .await?;
            count += 1;
        }
        Ok(count)
    }

    /// Get all questions for a course, oldest first
    pub async fn get_questions_by_course(&self, user_id: Uuid, course: &str) -> Result<Vec<DbQuestion>> {
        let questions = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT id, user_id, course, material_id, text, options, correct_answer,
                   topic, difficulty, confidence, origin, created_at
            FROM questions
            WHERE user_id = $1 AND course = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .bind(course)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    /// Count stored questions for a course
    pub async fn count_questions_by_course(&self, user_id: Uuid, course: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM questions
            WHERE user_id = $1 AND course = $2
            "#,
        )
        .bind(user_id)
        .bind(course)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // === Exam Attempt Repository ===

    /// Insert a finished exam attempt
    pub async fn insert_attempt(&self, attempt: &DbExamAttempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exam_attempts (id, user_id, course, total_questions, answered_count,
                                       correct_count, percentage, time_spent_secs,
                                       auto_submitted, breakdown, submitted_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.user_id)
        .bind(&attempt.course)
        .bind(attempt.total_questions)
        .bind(attempt.answered_count)
        .bind(attempt.correct_count)
        .bind(attempt.percentage)
        .bind(attempt.time_spent_secs)
        .bind(attempt.auto_submitted)
        .bind(&attempt.breakdown)
        .bind(attempt.submitted_at)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get attempts for a user, newest first, optionally filtered by course
    pub async fn get_attempts(&self, user_id: Uuid, course: Option<&str>) -> Result<Vec<DbExamAttempt>> {
        let attempts = match course {
            Some(course) => {
                sqlx::query_as::<_, DbExamAttempt>(
                    r#"
                    SELECT id, user_id, course, total_questions, answered_count, correct_count,
                           percentage, time_spent_secs, auto_submitted, breakdown,
                           submitted_at, created_at
                    FROM exam_attempts
                    WHERE user_id = $1 AND course = $2
                    ORDER BY submitted_at DESC
                    "#,
                )
                .bind(user_id)
                .bind(course)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbExamAttempt>(
                    r#"
                    SELECT id, user_id, course, total_questions, answered_count, correct_count,
                           percentage, time_spent_secs, auto_submitted, breakdown,
                           submitted_at, created_at
                    FROM exam_attempts
                    WHERE user_id = $1
                    ORDER BY submitted_at DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(attempts)
    }

    /// Get a single attempt with its breakdown
    pub async fn get_attempt(&self, user_id: Uuid, attempt_id: Uuid) -> Result<Option<DbExamAttempt>> {
        let attempt = sqlx::query_as::<_, DbExamAttempt>(
            r#"
            SELECT id, user_id, course, total_questions, answered_count, correct_count,
                   percentage, time_spent_secs, auto_submitted, breakdown,
                   submitted_at, created_at
            FROM exam_attempts
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    // === Deck Repository ===

    /// Create a flashcard deck
    pub async fn create_deck(&self, user_id: Uuid, course: &str, name: &str) -> Result<DbDeck> {
        let deck = sqlx::query_as::<_, DbDeck>(
            r#"
            INSERT INTO decks (user_id, course, name)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, course, name, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(course)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(deck)
    }

    /// Get all decks for a user with card counts, optionally filtered by course
    pub async fn get_decks(&self, user_id: Uuid, course: Option<&str>) -> Result<Vec<DeckInfo>> {
        let decks = match course {
            Some(course) => {
                sqlx::query_as::<_, DeckInfo>(
                    r#"
                    SELECT d.id, d.course, d.name, COUNT(f.id)::INT as card_count, d.created_at
                    FROM decks d
                    LEFT JOIN flashcards f ON f.deck_id = d.id
                    WHERE d.user_id = $1 AND d.course = $2
                    GROUP BY d.id
                    ORDER BY d.created_at
                    "#,
                )
                .bind(user_id)
                .bind(course)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DeckInfo>(
                    r#"
                    SELECT d.id, d.course, d.name, COUNT(f.id)::INT as card_count, d.created_at
                    FROM decks d
                    LEFT JOIN flashcards f ON f.deck_id = d.id
                    WHERE d.user_id = $1
                    GROUP BY d.id
                    ORDER BY d.created_at
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(decks)
    }

    /// Get a deck by id, scoped to a user
    pub async fn get_deck(&self, user_id: Uuid, deck_id: Uuid) -> Result<Option<DbDeck>> {
        let deck = sqlx::query_as::<_, DbDeck>(
            r#"
            SELECT id, user_id, course, name, created_at, updated_at
            FROM decks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(deck_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deck)
    }

    /// Delete a deck and its flashcards
    pub async fn delete_deck(&self, user_id: Uuid, deck_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM decks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(deck_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add a flashcard to a deck
    pub async fn insert_flashcard(&self, deck_id: Uuid, front: &str, back: &str) -> Result<DbFlashcard> {
        let card = sqlx::query_as::<_, DbFlashcard>(
            r#"
            INSERT INTO flashcards (deck_id, front, back)
            VALUES ($1, $2, $3)
            RETURNING id, deck_id, front, back, created_at, updated_at
            "#,
        )
        .bind(deck_id)
        .bind(front)
        .bind(back)
        .fetch_one(&self.pool)
        .await?;

        Ok(card)
    }

    /// Get all flashcards in a deck
    pub async fn get_flashcards(&self, deck_id: Uuid) -> Result<Vec<DbFlashcard>> {
        let cards = sqlx::query_as::<_, DbFlashcard>(
            r#"
            SELECT id, deck_id, front, back, created_at, updated_at
            FROM flashcards
            WHERE deck_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(deck_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    /// Delete a flashcard from a deck
    pub async fn delete_flashcard(&self, deck_id: Uuid, card_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM flashcards
            WHERE id = $1 AND deck_id = $2
            "#,
        )
        .bind(card_id)
        .bind(deck_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Tutor Repository ===

    /// Append a tutor conversation message
    pub async fn insert_tutor_message(
        &self,
        user_id: Uuid,
        course: &str,
        role: &str,
        content: &str,
    ) -> Result<DbTutorMessage> {
        let message = sqlx::query_as::<_, DbTutorMessage>(
            r#"
            INSERT INTO tutor_messages (user_id, course, role, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, course, role, content, created_at
            "#,
        )
        .bind(user_id)
        .bind(course)
        .bind(role)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    /// Get the most recent tutor messages for a course, oldest first
    pub async fn get_tutor_messages(
        &self,
        user_id: Uuid,
        course: &str,
        limit: i64,
    ) -> Result<Vec<DbTutorMessage>> {
        let mut messages = sqlx::query_as::<_, DbTutorMessage>(
            r#"
            SELECT id, user_id, course, role, content, created_at
            FROM tutor_messages
            WHERE user_id = $1 AND course = $2
            ORDER BY seq DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(course)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }
}
