//! Challenge repository

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Challenge, ChallengeChanges, ChallengeFilter, NewChallenge},
};

/// Persistence operations on challenges
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    async fn create(&self, challenge: NewChallenge) -> AppResult<Challenge>;

    /// Find an active challenge by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Challenge>>;

    /// Find an active challenge by slug
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Challenge>>;

    /// Whether any challenge, active or not, already uses the slug
    async fn slug_exists(&self, slug: &str) -> AppResult<bool>;

    async fn list(&self, filter: ChallengeFilter, offset: i64, limit: i64) -> AppResult<(Vec<Challenge>, i64)>;

    async fn update(&self, id: Uuid, changes: ChallengeChanges) -> AppResult<Challenge>;

    async fn deactivate(&self, id: Uuid) -> AppResult<()>;

    /// Count an attempt
    async fn increment_attempts(&self, id: Uuid) -> AppResult<()>;

    /// Count a successful completion and fold its time (when reported) and
    /// score into the running averages
    async fn record_success(&self, id: Uuid, execution_time_ms: Option<i64>, score: i32) -> AppResult<()>;

    /// Time limit in minutes, soft-deleted challenges included
    async fn find_time_limit(&self, id: Uuid) -> AppResult<Option<i32>>;
}

/// PostgreSQL-backed challenge repository
#[derive(Clone)]
pub struct PgChallengeRepository {
    pool: PgPool,
}

impl PgChallengeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChallengeRepository for PgChallengeRepository {
    async fn create(&self, challenge: NewChallenge) -> AppResult<Challenge> {
        let challenge = sqlx::query_as::<_, Challenge>(
            r#"
            INSERT INTO challenges (
                title, slug, description, challenge_type, difficulty, category, tags,
                content, code, scenario, time_limit_minutes, author_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&challenge.title)
        .bind(&challenge.slug)
        .bind(&challenge.description)
        .bind(&challenge.challenge_type)
        .bind(&challenge.difficulty)
        .bind(&challenge.category)
        .bind(&challenge.tags)
        .bind(Json(&challenge.content))
        .bind(Json(&challenge.code))
        .bind(Json(&challenge.scenario))
        .bind(challenge.time_limit_minutes)
        .bind(challenge.author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(challenge)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Challenge>> {
        let challenge = sqlx::query_as::<_, Challenge>(
            r#"SELECT * FROM challenges WHERE id = $1 AND is_active"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(challenge)
    }

    async fn find_time_limit(&self, id: Uuid) -> AppResult<Option<i32>> {
        let minutes = sqlx::query_scalar::<_, i32>(
            r#"SELECT time_limit_minutes FROM challenges WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(minutes)
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Challenge>> {
        let challenge = sqlx::query_as::<_, Challenge>(
            r#"SELECT * FROM challenges WHERE slug = $1 AND is_active"#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(challenge)
    }

    async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM challenges WHERE slug = $1)"#)
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn list(&self, filter: ChallengeFilter, offset: i64, limit: i64) -> AppResult<(Vec<Challenge>, i64)> {
        let search_pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let challenges = sqlx::query_as::<_, Challenge>(
            r#"
            SELECT * FROM challenges
            WHERE
                is_active
                AND ($1::text IS NULL OR challenge_type = $1)
                AND ($2::text IS NULL OR difficulty = $2)
                AND ($3::text IS NULL OR category = $3)
                AND ($4::text IS NULL OR title ILIKE $4)
            ORDER BY created_at DESC
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(&filter.challenge_type)
        .bind(&filter.difficulty)
        .bind(&filter.category)
        .bind(&search_pattern)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM challenges
            WHERE
                is_active
                AND ($1::text IS NULL OR challenge_type = $1)
                AND ($2::text IS NULL OR difficulty = $2)
                AND ($3::text IS NULL OR category = $3)
                AND ($4::text IS NULL OR title ILIKE $4)
            "#,
        )
        .bind(&filter.challenge_type)
        .bind(&filter.difficulty)
        .bind(&filter.category)
        .bind(&search_pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((challenges, count))
    }

    async fn update(&self, id: Uuid, changes: ChallengeChanges) -> AppResult<Challenge> {
        let challenge = sqlx::query_as::<_, Challenge>(
            r#"
            UPDATE challenges
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                difficulty = COALESCE($4, difficulty),
                category = COALESCE($5, category),
                tags = COALESCE($6, tags),
                content = COALESCE($7, content),
                code = COALESCE($8, code),
                scenario = COALESCE($9, scenario),
                time_limit_minutes = COALESCE($10, time_limit_minutes),
                updated_at = NOW()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.difficulty)
        .bind(&changes.category)
        .bind(&changes.tags)
        .bind(changes.content.map(Json))
        .bind(changes.code.map(Json))
        .bind(changes.scenario.map(Json))
        .bind(changes.time_limit_minutes)
        .fetch_one(&self.pool)
        .await?;

        Ok(challenge)
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(r#"UPDATE challenges SET is_active = FALSE, updated_at = NOW() WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn increment_attempts(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE challenges
            SET
                total_attempts = total_attempts + 1,
                popularity_score = popularity_score + 1
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_success(&self, id: Uuid, execution_time_ms: Option<i64>, score: i32) -> AppResult<()> {
        // Right-hand sides see the pre-update row, so the divisor is the new count.
        // A NULL time leaves the time average and its counter alone.
        sqlx::query(
            r#"
            UPDATE challenges
            SET
                successful_attempts = successful_attempts + 1,
                timed_attempts = timed_attempts + CASE WHEN $2::float8 IS NULL THEN 0 ELSE 1 END,
                average_time = CASE
                    WHEN $2::float8 IS NULL THEN average_time
                    ELSE average_time + ($2::float8 - average_time) / (timed_attempts + 1)
                END,
                average_score = average_score + ($3::float8 - average_score) / (successful_attempts + 1),
                popularity_score = popularity_score + 2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(execution_time_ms.map(|ms| ms as f64))
        .bind(f64::from(score))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
