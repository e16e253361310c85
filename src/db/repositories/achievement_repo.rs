//! Achievement catalog and unlock ledger repository

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Achievement, AchievementChanges, AchievementFilter, NewAchievement, UserAchievement},
};

/// Persistence operations on achievements and unlocks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    async fn list(&self, filter: AchievementFilter) -> AppResult<Vec<Achievement>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Achievement>>;

    /// Find an active achievement by its unique name
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Achievement>>;

    /// Find the active, language-independent achievement with the given
    /// criteria type and target
    async fn find_by_criteria(&self, criteria_type: &str, target: i64) -> AppResult<Option<Achievement>>;

    /// All active achievements of a criteria type
    async fn list_by_criteria_type(&self, criteria_type: &str) -> AppResult<Vec<Achievement>>;

    async fn create(&self, achievement: NewAchievement) -> AppResult<Achievement>;

    async fn update(&self, id: Uuid, changes: AchievementChanges) -> AppResult<Achievement>;

    async fn deactivate(&self, id: Uuid) -> AppResult<()>;

    async fn user_has(&self, user_id: Uuid, achievement_id: Uuid) -> AppResult<bool>;

    /// Insert an unlock. A second unlock of the same pair fails with
    /// `AppError::AlreadyExists` from the unique index.
    async fn insert_unlock(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
        metadata: serde_json::Value,
    ) -> AppResult<UserAchievement>;

    /// Unlocks of one user with their definitions, newest first
    async fn list_unlocked(&self, user_id: Uuid) -> AppResult<Vec<(UserAchievement, Achievement)>>;
}

/// PostgreSQL-backed achievement repository
#[derive(Clone)]
pub struct PgAchievementRepository {
    pool: PgPool,
}

impl PgAchievementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UnlockRow {
    #[sqlx(flatten)]
    achievement: Achievement,
    unlock_id: Uuid,
    user_id: Uuid,
    unlocked_at: chrono::DateTime<chrono::Utc>,
    progress: i32,
    metadata: Json<serde_json::Value>,
}

#[async_trait]
impl AchievementRepository for PgAchievementRepository {
    async fn list(&self, filter: AchievementFilter) -> AppResult<Vec<Achievement>> {
        let achievements = sqlx::query_as::<_, Achievement>(
            r#"
            SELECT * FROM achievements
            WHERE
                is_active
                AND ($1::text IS NULL OR category = $1)
                AND ($2::text IS NULL OR rarity = $2)
                AND ($3 OR NOT is_hidden)
            ORDER BY category, criteria_target, name
            "#,
        )
        .bind(&filter.category)
        .bind(&filter.rarity)
        .bind(filter.include_hidden)
        .fetch_all(&self.pool)
        .await?;

        Ok(achievements)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Achievement>> {
        let achievement = sqlx::query_as::<_, Achievement>(r#"SELECT * FROM achievements WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(achievement)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Achievement>> {
        let achievement = sqlx::query_as::<_, Achievement>(
            r#"SELECT * FROM achievements WHERE name = $1 AND is_active"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(achievement)
    }

    async fn find_by_criteria(&self, criteria_type: &str, target: i64) -> AppResult<Option<Achievement>> {
        let achievement = sqlx::query_as::<_, Achievement>(
            r#"
            SELECT * FROM achievements
            WHERE criteria_type = $1 AND criteria_target = $2 AND is_active
                AND NOT (criteria_conditions ? 'language')
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(criteria_type)
        .bind(target)
        .fetch_optional(&self.pool)
        .await?;

        Ok(achievement)
    }

    async fn list_by_criteria_type(&self, criteria_type: &str) -> AppResult<Vec<Achievement>> {
        let achievements = sqlx::query_as::<_, Achievement>(
            r#"SELECT * FROM achievements WHERE criteria_type = $1 AND is_active ORDER BY criteria_target"#,
        )
        .bind(criteria_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(achievements)
    }

    async fn create(&self, achievement: NewAchievement) -> AppResult<Achievement> {
        let achievement = sqlx::query_as::<_, Achievement>(
            r#"
            INSERT INTO achievements (
                name, description, icon, category, criteria_type, criteria_target,
                criteria_conditions, reward_xp, reward_badge, reward_title, rarity, is_hidden
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&achievement.name)
        .bind(&achievement.description)
        .bind(&achievement.icon)
        .bind(&achievement.category)
        .bind(&achievement.criteria_type)
        .bind(achievement.criteria_target)
        .bind(Json(&achievement.criteria_conditions))
        .bind(achievement.reward_xp)
        .bind(&achievement.reward_badge)
        .bind(&achievement.reward_title)
        .bind(&achievement.rarity)
        .bind(achievement.is_hidden)
        .fetch_one(&self.pool)
        .await?;

        Ok(achievement)
    }

    async fn update(&self, id: Uuid, changes: AchievementChanges) -> AppResult<Achievement> {
        let achievement = sqlx::query_as::<_, Achievement>(
            r#"
            UPDATE achievements
            SET
                description = COALESCE($2, description),
                icon = COALESCE($3, icon),
                category = COALESCE($4, category),
                criteria_target = COALESCE($5, criteria_target),
                criteria_conditions = COALESCE($6, criteria_conditions),
                reward_xp = COALESCE($7, reward_xp),
                reward_badge = COALESCE($8, reward_badge),
                reward_title = COALESCE($9, reward_title),
                rarity = COALESCE($10, rarity),
                is_hidden = COALESCE($11, is_hidden),
                is_active = COALESCE($12, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.description)
        .bind(&changes.icon)
        .bind(&changes.category)
        .bind(changes.criteria_target)
        .bind(changes.criteria_conditions.map(Json))
        .bind(changes.reward_xp)
        .bind(&changes.reward_badge)
        .bind(&changes.reward_title)
        .bind(&changes.rarity)
        .bind(changes.is_hidden)
        .bind(changes.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(achievement)
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(r#"UPDATE achievements SET is_active = FALSE, updated_at = NOW() WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn user_has(&self, user_id: Uuid, achievement_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM user_achievements WHERE user_id = $1 AND achievement_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_unlock(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
        metadata: serde_json::Value,
    ) -> AppResult<UserAchievement> {
        let unlock = sqlx::query_as::<_, UserAchievement>(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id, progress, metadata)
            VALUES ($1, $2, 100, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .bind(Json(metadata))
        .fetch_one(&self.pool)
        .await?;

        Ok(unlock)
    }

    async fn list_unlocked(&self, user_id: Uuid) -> AppResult<Vec<(UserAchievement, Achievement)>> {
        let rows = sqlx::query_as::<_, UnlockRow>(
            r#"
            SELECT
                a.*,
                ua.id AS unlock_id,
                ua.user_id,
                ua.unlocked_at,
                ua.progress,
                ua.metadata
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            WHERE ua.user_id = $1
            ORDER BY ua.unlocked_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let unlock = UserAchievement {
                    id: row.unlock_id,
                    user_id: row.user_id,
                    achievement_id: row.achievement.id,
                    unlocked_at: row.unlocked_at,
                    progress: row.progress,
                    metadata: row.metadata,
                };
                (unlock, row.achievement)
            })
            .collect())
    }
}
