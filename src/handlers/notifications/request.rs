//! Notification request DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::priorities,
    handlers::common::PageQuery,
    models::{NotificationDraft, NotificationFilter},
    utils::validation::{validate_channels, validate_notification_type, validate_priority},
};

/// Admin bulk send
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkNotificationRequest {
    #[validate(length(min = 1, max = 1000, message = "Between 1 and 1000 recipients"))]
    pub recipient_ids: Vec<Uuid>,

    #[serde(rename = "type")]
    #[validate(custom(function = "validate_notification_type"))]
    pub notification_type: String,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 1000))]
    pub message: String,

    pub data: Option<Value>,

    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_channels"))]
    pub channels: Vec<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl BulkNotificationRequest {
    /// Split into recipients and the shared draft
    pub fn into_parts(self) -> (Vec<Uuid>, NotificationDraft) {
        let draft = NotificationDraft {
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            data: self.data.unwrap_or_else(|| Value::Object(Default::default())),
            priority: self.priority.unwrap_or_else(|| priorities::NORMAL.to_string()),
            channels: self.channels,
            expires_at: self.expires_at,
        };
        (self.recipient_ids, draft)
    }
}

/// `GET /notifications` query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListNotificationsQuery {
    pub fn into_parts(self) -> (NotificationFilter, PageQuery) {
        (
            NotificationFilter {
                unread_only: self.unread_only,
                notification_type: self.notification_type,
            },
            PageQuery {
                page: self.page,
                limit: self.limit,
            },
        )
    }
}
