//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::constants::{notification_types, roles, scoring};

/// User database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile: Json<Profile>,
    pub preferences: Json<Preferences>,
    pub role: String,

    // Progression stats
    pub level: i32,
    pub xp: i64,
    pub total_challenges: i32,
    pub completed_challenges: i32,
    pub streak: i32,
    pub last_active_date: Option<DateTime<Utc>>,

    // Lockout state
    pub login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,

    pub is_email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,

    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account is locked at the given instant
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// Check if user has admin privileges
    pub fn is_admin(&self) -> bool {
        self.role == roles::ADMIN
    }

    /// Whether the user wants notifications of the given type at all
    pub fn accepts_notification_type(&self, notification_type: &str) -> bool {
        let prefs = &self.preferences.notifications;
        match notification_type {
            notification_types::ACHIEVEMENT => prefs.achievements,
            notification_types::CHALLENGE => prefs.challenges,
            notification_types::SOCIAL => prefs.social,
            _ => true,
        }
    }

    /// Whether the user accepts delivery through the given channel
    pub fn accepts_channel(&self, channel: &str) -> bool {
        let prefs = &self.preferences.notifications;
        match channel {
            crate::constants::channels::EMAIL => prefs.email,
            crate::constants::channels::PUSH => prefs.push,
            _ => false,
        }
    }
}

/// Level for a given XP total. Levels start at 1 and advance every
/// `XP_PER_LEVEL` points.
pub fn level_for_xp(xp: i64) -> i32 {
    (xp.max(0) / scoring::XP_PER_LEVEL + 1) as i32
}

/// Public profile details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: String,
    pub notifications: NotificationPreferences,
    pub privacy: PrivacyPreferences,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            notifications: NotificationPreferences::default(),
            privacy: PrivacyPreferences::default(),
        }
    }
}

/// Per-type and per-channel notification toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub email: bool,
    pub push: bool,
    pub achievements: bool,
    pub challenges: bool,
    pub social: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            achievements: true,
            challenges: true,
            social: true,
        }
    }
}

/// Profile visibility toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacyPreferences {
    pub show_profile: bool,
    pub show_stats: bool,
    pub show_activity: bool,
}

impl Default for PrivacyPreferences {
    fn default() -> Self {
        Self {
            show_profile: true,
            show_stats: true,
            show_activity: true,
        }
    }
}

/// Fields needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: Profile,
    pub email_verification_token: Option<String>,
}

/// Outcome of an XP award
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    pub awarded: i64,
    pub xp: i64,
    pub previous_level: i32,
    pub level: i32,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}
