//! Notification service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use uuid::Uuid;

use crate::{
    db::repositories::{NotificationRepository, UserRepository},
    error::{AppError, AppResult},
    models::{Notification, NotificationDraft, NotificationFilter, NotificationStats, User},
    services::delivery::{EmailChannel, NotificationChannel, PushChannel},
};

/// Notification creation, delivery and inbox management
pub struct NotificationService {
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationRepository>,
        channels: Vec<Arc<dyn NotificationChannel>>,
    ) -> Self {
        Self {
            users,
            notifications,
            channels,
        }
    }

    /// Service delivering through the email and push channels
    pub fn with_default_channels(
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self::new(
            users,
            notifications,
            vec![Arc::new(EmailChannel), Arc::new(PushChannel)],
        )
    }

    /// Create a notification for one user and deliver it.
    ///
    /// Returns `Ok(None)` when the user turned this notification type off;
    /// no row is written in that case.
    pub async fn send(&self, recipient_id: Uuid, draft: &NotificationDraft) -> AppResult<Option<Notification>> {
        let recipient = self
            .users
            .find_by_id(recipient_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        self.send_to(&recipient, draft).await
    }

    /// Send the same draft to many users. Unknown recipients and per-user
    /// failures are skipped; returns the number of notifications created.
    pub async fn send_bulk(&self, recipient_ids: &[Uuid], draft: &NotificationDraft) -> usize {
        let mut created = 0;

        for &recipient_id in recipient_ids {
            match self.send(recipient_id, draft).await {
                Ok(Some(_)) => created += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(recipient_id = %recipient_id, error = %e, "Bulk notification skipped");
                }
            }
        }

        tracing::info!(requested = recipient_ids.len(), created, "Bulk notification sent");
        created
    }

    async fn send_to(&self, recipient: &User, draft: &NotificationDraft) -> AppResult<Option<Notification>> {
        if !recipient.accepts_notification_type(&draft.notification_type) {
            tracing::debug!(
                user_id = %recipient.id,
                notification_type = %draft.notification_type,
                "Notification suppressed by user preferences"
            );
            return Ok(None);
        }

        let notification = self.notifications.create(draft.addressed_to(recipient)).await?;
        Ok(Some(self.deliver(recipient, notification).await))
    }

    /// Attempt every requested channel concurrently. The notification is
    /// marked delivered once all attempts settle, whatever their outcome.
    async fn deliver(&self, recipient: &User, mut notification: Notification) -> Notification {
        let results = {
            let target = &notification;
            let attempts = target
                .channels
                .iter()
                .filter_map(|name| self.channels.iter().find(|channel| channel.name() == name))
                .map(|channel| async move { (channel.name(), channel.deliver(recipient, target).await) });

            join_all(attempts).await
        };

        for (channel, result) in results {
            if let Err(e) = result {
                tracing::warn!(
                    notification_id = %notification.id,
                    channel,
                    error = %e,
                    "Notification channel failed"
                );
            }
        }

        let now = Utc::now();
        match self.notifications.mark_delivered(notification.id, now).await {
            Ok(()) => {
                notification.is_delivered = true;
                notification.delivered_at = Some(now);
            }
            Err(e) => {
                tracing::warn!(notification_id = %notification.id, error = %e, "Failed to mark notification delivered");
            }
        }

        notification
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
        page: u32,
        per_page: u32,
    ) -> AppResult<(Vec<Notification>, i64)> {
        let offset = (page.saturating_sub(1) * per_page) as i64;
        self.notifications
            .list_for_user(user_id, filter, offset, per_page as i64)
            .await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        self.notifications.count_unread(user_id).await
    }

    pub async fn stats(&self, user_id: Uuid) -> AppResult<NotificationStats> {
        self.notifications.stats(user_id).await
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Notification> {
        self.notifications
            .mark_read(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        self.notifications.mark_all_read(user_id).await
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        if self.notifications.delete(id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Notification not found".to_string()))
        }
    }

    /// Remove every notification past its expiry
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.notifications.delete_expired(now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{channels, notification_types, priorities},
        test_utils::InMemoryStore,
    };
    use async_trait::async_trait;
    use chrono::Duration;

    struct FailingChannel;

    #[async_trait]
    impl NotificationChannel for FailingChannel {
        fn name(&self) -> &'static str {
            channels::EMAIL
        }

        async fn deliver(&self, _recipient: &User, _notification: &Notification) -> AppResult<()> {
            Err(AppError::Internal(anyhow::anyhow!("smtp unreachable")))
        }
    }

    fn draft(notification_type: &str) -> NotificationDraft {
        NotificationDraft {
            notification_type: notification_type.to_string(),
            title: "Hello".to_string(),
            message: "World".to_string(),
            data: serde_json::json!({}),
            priority: priorities::NORMAL.to_string(),
            channels: vec![channels::EMAIL.to_string(), channels::PUSH.to_string()],
            expires_at: None,
        }
    }

    fn service(store: &Arc<InMemoryStore>) -> NotificationService {
        NotificationService::with_default_channels(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_disabled_type_creates_nothing() {
        let store = InMemoryStore::new();
        let user = store.insert_user("quiet");
        store.update_user(user.id, |u| u.preferences.notifications.achievements = false);

        let sent = service(&store)
            .send(user.id, &draft(notification_types::ACHIEVEMENT))
            .await
            .unwrap();

        assert!(sent.is_none());
        assert!(store.notifications_for(user.id).is_empty());
    }

    #[tokio::test]
    async fn test_system_notifications_ignore_type_toggles() {
        let store = InMemoryStore::new();
        let user = store.insert_user("admin_mail");
        store.update_user(user.id, |u| {
            u.preferences.notifications.achievements = false;
            u.preferences.notifications.challenges = false;
            u.preferences.notifications.social = false;
        });

        let sent = service(&store)
            .send(user.id, &draft(notification_types::SYSTEM))
            .await
            .unwrap();

        assert!(sent.is_some());
    }

    #[tokio::test]
    async fn test_channels_follow_preferences() {
        let store = InMemoryStore::new();
        let user = store.insert_user("nopush");
        store.update_user(user.id, |u| u.preferences.notifications.push = false);

        let sent = service(&store)
            .send(user.id, &draft(notification_types::CHALLENGE))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sent.channels, vec![channels::EMAIL.to_string()]);
        assert!(sent.is_delivered);
    }

    #[tokio::test]
    async fn test_delivery_marked_even_when_channel_fails() {
        let store = InMemoryStore::new();
        let user = store.insert_user("unlucky");
        let notifications = NotificationService::new(
            store.clone(),
            store.clone(),
            vec![Arc::new(FailingChannel), Arc::new(PushChannel)],
        );

        let sent = notifications
            .send(user.id, &draft(notification_types::SOCIAL))
            .await
            .unwrap()
            .unwrap();

        assert!(sent.is_delivered);
        let stored = store.notifications_for(user.id);
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_delivered);
        assert!(stored[0].delivered_at.is_some());
    }

    #[tokio::test]
    async fn test_bulk_counts_only_created() {
        let store = InMemoryStore::new();
        let a = store.insert_user("alpha");
        let b = store.insert_user("bravo");
        store.update_user(b.id, |u| u.preferences.notifications.challenges = false);

        let created = service(&store)
            .send_bulk(&[a.id, b.id, Uuid::new_v4()], &draft(notification_types::CHALLENGE))
            .await;

        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_inbox_operations() {
        let store = InMemoryStore::new();
        let owner = store.insert_user("owner");
        let other = store.insert_user("other");
        let notifications = service(&store);

        let first = notifications
            .send(owner.id, &draft(notification_types::SYSTEM))
            .await
            .unwrap()
            .unwrap();
        notifications
            .send(owner.id, &draft(notification_types::CHALLENGE))
            .await
            .unwrap();

        assert_eq!(notifications.unread_count(owner.id).await.unwrap(), 2);

        let err = notifications.mark_read(first.id, other.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let read = notifications.mark_read(first.id, owner.id).await.unwrap();
        assert!(read.is_read);
        assert_eq!(notifications.unread_count(owner.id).await.unwrap(), 1);

        let stats = notifications.stats(owner.id).await.unwrap();
        assert_eq!((stats.total, stats.unread), (2, 1));
        assert_eq!(stats.by_type.get(notification_types::SYSTEM), Some(&1));

        let (unread, total) = notifications
            .list(
                owner.id,
                NotificationFilter {
                    unread_only: true,
                    notification_type: None,
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!((unread.len(), total), (1, 1));

        assert_eq!(notifications.mark_all_read(owner.id).await.unwrap(), 1);
        assert!(notifications.delete(first.id, other.id).await.is_err());
        notifications.delete(first.id, owner.id).await.unwrap();
        assert_eq!(store.notifications_for(owner.id).len(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemoryStore::new();
        let user = store.insert_user("ttl");
        let notifications = service(&store);
        let now = Utc::now();

        let mut expiring = draft(notification_types::SYSTEM);
        expiring.expires_at = Some(now - Duration::minutes(1));
        notifications.send(user.id, &expiring).await.unwrap();
        notifications
            .send(user.id, &draft(notification_types::SYSTEM))
            .await
            .unwrap();

        assert_eq!(notifications.purge_expired(now).await.unwrap(), 1);
        assert_eq!(store.notifications_for(user.id).len(), 1);
    }
}
