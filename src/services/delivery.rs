//! Notification delivery channels
//!
//! Real email and push providers sit outside this service; the channels here
//! hand the message off by logging it.

use async_trait::async_trait;

use crate::{
    constants::channels,
    error::AppResult,
    models::{Notification, User},
};

/// One way of reaching a user
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel identifier as stored in `Notification::channels`
    fn name(&self) -> &'static str;

    async fn deliver(&self, recipient: &User, notification: &Notification) -> AppResult<()>;
}

pub struct EmailChannel;

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str {
        channels::EMAIL
    }

    async fn deliver(&self, recipient: &User, notification: &Notification) -> AppResult<()> {
        tracing::info!(
            notification_id = %notification.id,
            to = %recipient.email,
            subject = %notification.title,
            "Email notification dispatched"
        );
        Ok(())
    }
}

pub struct PushChannel;

#[async_trait]
impl NotificationChannel for PushChannel {
    fn name(&self) -> &'static str {
        channels::PUSH
    }

    async fn deliver(&self, recipient: &User, notification: &Notification) -> AppResult<()> {
        tracing::info!(
            notification_id = %notification.id,
            user_id = %recipient.id,
            title = %notification.title,
            "Push notification dispatched"
        );
        Ok(())
    }
}
