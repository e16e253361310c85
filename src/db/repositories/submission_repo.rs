//! Submission repository

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    constants::statuses,
    error::AppResult,
    models::{ExecutionOutcome, NewSubmission, Submission, SubmissionFilter},
};

/// Persistence operations on submissions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Insert a submission in `pending` state
    async fn create(&self, submission: NewSubmission) -> AppResult<Submission>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Submission>>;

    /// Write the terminal execution block. Only a pending submission can be
    /// completed; returns `None` when the row is no longer pending.
    async fn complete(&self, id: Uuid, outcome: ExecutionOutcome) -> AppResult<Option<Submission>>;

    async fn list(&self, filter: SubmissionFilter, offset: i64, limit: i64) -> AppResult<(Vec<Submission>, i64)>;

    async fn recent_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Submission>>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Number of submissions of the user with status `completed`
    async fn count_completed(&self, user_id: Uuid) -> AppResult<i64>;

    /// Number of `completed` submissions of the user in one language
    async fn count_completed_in_language(&self, user_id: Uuid, language: &str) -> AppResult<i64>;
}

/// PostgreSQL-backed submission repository
#[derive(Clone)]
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn create(&self, submission: NewSubmission) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (user_id, challenge_id, language, code, status, simulation, started_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(submission.user_id)
        .bind(submission.challenge_id)
        .bind(&submission.language)
        .bind(&submission.code)
        .bind(statuses::PENDING)
        .bind(Json(&submission.simulation))
        .bind(submission.started_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(submission)
    }

    async fn complete(&self, id: Uuid, outcome: ExecutionOutcome) -> AppResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET
                status = $2,
                score = $3,
                total_tests = $4,
                passed_tests = $5,
                execution_time_ms = $6,
                memory_usage_kb = $7,
                output = $8,
                error = $9,
                test_results = $10,
                browser_environment = $11,
                submitted_at = $12,
                is_completed = TRUE,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(outcome.status.as_str())
        .bind(outcome.score)
        .bind(outcome.total_tests)
        .bind(outcome.passed_tests)
        .bind(outcome.execution_time_ms)
        .bind(outcome.memory_usage_kb)
        .bind(&outcome.output)
        .bind(&outcome.error)
        .bind(Json(&outcome.test_results))
        .bind(outcome.browser_environment.map(Json))
        .bind(outcome.submitted_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn list(&self, filter: SubmissionFilter, offset: i64, limit: i64) -> AppResult<(Vec<Submission>, i64)> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE
                ($1::uuid IS NULL OR user_id = $1)
                AND ($2::uuid IS NULL OR challenge_id = $2)
                AND ($3::text IS NULL OR language = $3)
                AND ($4::text IS NULL OR status = $4)
            ORDER BY created_at DESC
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.challenge_id)
        .bind(&filter.language)
        .bind(&filter.status)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM submissions
            WHERE
                ($1::uuid IS NULL OR user_id = $1)
                AND ($2::uuid IS NULL OR challenge_id = $2)
                AND ($3::text IS NULL OR language = $3)
                AND ($4::text IS NULL OR status = $4)
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.challenge_id)
        .bind(&filter.language)
        .bind(&filter.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((submissions, count))
    }

    async fn recent_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(r#"DELETE FROM submissions WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_completed(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM submissions WHERE user_id = $1 AND status = 'completed'"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_completed_in_language(&self, user_id: Uuid, language: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM submissions
            WHERE user_id = $1 AND language = $2 AND status = 'completed'
            "#,
        )
        .bind(user_id)
        .bind(language)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
