//! Notification model

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

/// A row from the `notifications` table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: Json<serde_json::Value>,
    pub priority: String,
    pub channels: Vec<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Fields needed to insert a notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub priority: String,
    pub channels: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Inbox listing filters
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub unread_only: bool,
    pub notification_type: Option<String>,
}

/// Inbox statistics for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total: i64,
    pub unread: i64,
    pub by_type: HashMap<String, i64>,
}

/// Notification content before a recipient is chosen
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub priority: String,
    pub channels: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NotificationDraft {
    /// Address the draft to one user, keeping only the channels they accept
    pub fn addressed_to(&self, recipient: &crate::models::User) -> NewNotification {
        NewNotification {
            recipient_id: recipient.id,
            notification_type: self.notification_type.clone(),
            title: self.title.clone(),
            message: self.message.clone(),
            data: self.data.clone(),
            priority: self.priority.clone(),
            channels: self
                .channels
                .iter()
                .filter(|channel| recipient.accepts_channel(channel))
                .cloned()
                .collect(),
            expires_at: self.expires_at,
        }
    }
}
