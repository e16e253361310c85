//! User repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{NewUser, Preferences, Profile, User},
};

/// Persistence operations on users
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Find an active user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find an active user by username or email (for login)
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>>;

    async fn find_by_verification_token(&self, token_hash: &str) -> AppResult<Option<User>>;

    /// Find a user holding an unexpired password reset token
    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<Option<User>>;

    /// Atomically bump the failed login counter, returning the new value
    async fn increment_login_attempts(&self, id: Uuid) -> AppResult<i32>;

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> AppResult<()>;

    /// Forget failed logins and any expired lock
    async fn reset_login_attempts(&self, id: Uuid) -> AppResult<()>;

    /// Clear lockout state and record a successful login
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    async fn increment_total_challenges(&self, id: Uuid) -> AppResult<()>;

    async fn increment_completed_challenges(&self, id: Uuid) -> AppResult<()>;

    /// Add XP and recompute the level in one statement. Returns the new XP total.
    async fn add_xp(&self, id: Uuid, amount: i64) -> AppResult<i64>;

    async fn update_streak(&self, id: Uuid, streak: i32, last_active: DateTime<Utc>) -> AppResult<()>;

    async fn update_profile(&self, id: Uuid, profile: Profile, preferences: Preferences) -> AppResult<User>;

    /// Store a new password hash, clearing reset token and lockout
    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expires: DateTime<Utc>) -> AppResult<()>;

    async fn mark_email_verified(&self, id: Uuid) -> AppResult<()>;

    async fn deactivate(&self, id: Uuid) -> AppResult<()>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, profile, email_verification_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Json(&user.profile))
        .bind(&user.email_verification_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1 AND is_active"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = LOWER($1)"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE username = $1"#)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users WHERE (username = $1 OR email = LOWER($1)) AND is_active"#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_verification_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users WHERE email_verification_token = $1 AND is_active"#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE password_reset_token = $1 AND password_reset_expires > $2 AND is_active
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn increment_login_attempts(&self, id: Uuid) -> AppResult<i32> {
        let attempts: i32 = sqlx::query_scalar(
            r#"
            UPDATE users SET login_attempts = login_attempts + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING login_attempts
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(r#"UPDATE users SET lock_until = $2, updated_at = NOW() WHERE id = $1"#)
            .bind(id)
            .bind(until)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn reset_login_attempts(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(r#"UPDATE users SET login_attempts = 0, lock_until = NULL WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET login_attempts = 0, lock_until = NULL, last_login_at = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn increment_total_challenges(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(r#"UPDATE users SET total_challenges = total_challenges + 1 WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn increment_completed_challenges(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"UPDATE users SET completed_challenges = completed_challenges + 1 WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_xp(&self, id: Uuid, amount: i64) -> AppResult<i64> {
        let xp: i64 = sqlx::query_scalar(
            r#"
            UPDATE users
            SET
                xp = GREATEST(xp + $2, 0),
                level = (GREATEST(xp + $2, 0) / 1000) + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING xp
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(xp)
    }

    async fn update_streak(&self, id: Uuid, streak: i32, last_active: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"UPDATE users SET streak = $2, last_active_date = $3, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(id)
        .bind(streak)
        .bind(last_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_profile(&self, id: Uuid, profile: Profile, preferences: Preferences) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET profile = $2, preferences = $3, updated_at = NOW()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(profile))
        .bind(Json(preferences))
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET
                password_hash = $2,
                password_reset_token = NULL,
                password_reset_expires = NULL,
                login_attempts = 0,
                lock_until = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expires: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2, password_reset_expires = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_email_verified = TRUE, email_verification_token = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(r#"UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
