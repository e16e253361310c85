//! Notification repository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{NewNotification, Notification, NotificationFilter, NotificationStats},
};

/// Persistence operations on notifications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification>;

    /// Unexpired notifications of one user, newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Notification>, i64)>;

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64>;

    async fn stats(&self, user_id: Uuid) -> AppResult<NotificationStats>;

    /// Mark one notification read; `None` when it does not belong to the user
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>>;

    /// Mark every unread notification of the user read; returns how many changed
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;

    /// Delete one notification of the user; `false` when nothing matched
    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool>;

    async fn mark_delivered(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Remove every notification whose expiry is at or before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// PostgreSQL-backed notification repository
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                recipient_id, notification_type, title, message, data, priority, channels, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(notification.recipient_id)
        .bind(&notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(Json(&notification.data))
        .bind(&notification.priority)
        .bind(&notification.channels)
        .bind(notification.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Notification>, i64)> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE
                recipient_id = $1
                AND (expires_at IS NULL OR expires_at > NOW())
                AND (NOT $2 OR NOT is_read)
                AND ($3::text IS NULL OR notification_type = $3)
            ORDER BY created_at DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(user_id)
        .bind(filter.unread_only)
        .bind(&filter.notification_type)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE
                recipient_id = $1
                AND (expires_at IS NULL OR expires_at > NOW())
                AND (NOT $2 OR NOT is_read)
                AND ($3::text IS NULL OR notification_type = $3)
            "#,
        )
        .bind(user_id)
        .bind(filter.unread_only)
        .bind(&filter.notification_type)
        .fetch_one(&self.pool)
        .await?;

        Ok((notifications, count))
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE recipient_id = $1 AND NOT is_read
                AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn stats(&self, user_id: Uuid) -> AppResult<NotificationStats> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                notification_type,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE NOT is_read) AS unread
            FROM notifications
            WHERE recipient_id = $1 AND (expires_at IS NULL OR expires_at > NOW())
            GROUP BY notification_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = NotificationStats {
            by_type: HashMap::with_capacity(rows.len()),
            ..Default::default()
        };
        for (notification_type, total, unread) in rows {
            stats.total += total;
            stats.unread += unread;
            stats.by_type.insert(notification_type, total);
        }

        Ok(stats)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND recipient_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = NOW()
            WHERE recipient_id = $1 AND NOT is_read
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM notifications WHERE id = $1 AND recipient_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_delivered(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(r#"UPDATE notifications SET is_delivered = TRUE, delivered_at = $2 WHERE id = $1"#)
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(r#"DELETE FROM notifications WHERE expires_at <= $1"#)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
