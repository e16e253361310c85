//! Notification response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::Notification;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub priority: String,
    pub channels: Vec<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            data: n.data.0,
            priority: n.priority,
            channels: n.channels,
            is_read: n.is_read,
            read_at: n.read_at,
            is_delivered: n.is_delivered,
            expires_at: n.expires_at,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedCountResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResultResponse {
    pub requested: usize,
    pub created: usize,
}
