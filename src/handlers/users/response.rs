//! User response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{Preferences, Profile, User},
    services::user_service::UserStats,
};

/// The account as its owner sees it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile: Profile,
    pub preferences: Preferences,
    pub role: String,
    pub level: i32,
    pub xp: i64,
    pub streak: i32,
    pub total_challenges: i32,
    pub completed_challenges: i32,
    pub is_email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            profile: user.profile.0,
            preferences: user.preferences.0,
            role: user.role,
            level: user.level,
            xp: user.xp,
            streak: user.streak,
            total_challenges: user.total_challenges,
            completed_challenges: user.completed_challenges,
            is_email_verified: user.is_email_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// `GET /users/me`: profile plus progression
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserResponse,
    pub stats: UserStats,
}
