//! Achievement catalog and unlock ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::constants::achievements::LEVEL_CONDITION_KEY;

/// Achievement definition
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub category: String,
    pub criteria_type: String,
    pub criteria_target: i64,
    pub criteria_conditions: Json<serde_json::Value>,
    pub reward_xp: i32,
    pub reward_badge: Option<String>,
    pub reward_title: Option<String>,
    pub rarity: String,
    pub is_hidden: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Achievement {
    /// Level this achievement is tied to, for level-threshold achievements
    pub fn required_level(&self) -> Option<i64> {
        self.criteria_conditions
            .get(LEVEL_CONDITION_KEY)
            .and_then(|v| v.as_i64())
    }
}

/// Per-user unlock record, unique per (user, achievement)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub unlocked_at: DateTime<Utc>,
    pub progress: i32,
    pub metadata: Json<serde_json::Value>,
}

/// Fields needed to define an achievement
#[derive(Debug, Clone)]
pub struct NewAchievement {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub category: String,
    pub criteria_type: String,
    pub criteria_target: i64,
    pub criteria_conditions: serde_json::Value,
    pub reward_xp: i32,
    pub reward_badge: Option<String>,
    pub reward_title: Option<String>,
    pub rarity: String,
    pub is_hidden: bool,
}

/// Partial achievement update
#[derive(Debug, Clone, Default)]
pub struct AchievementChanges {
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub criteria_target: Option<i64>,
    pub criteria_conditions: Option<serde_json::Value>,
    pub reward_xp: Option<i32>,
    pub reward_badge: Option<String>,
    pub reward_title: Option<String>,
    pub rarity: Option<String>,
    pub is_hidden: Option<bool>,
    pub is_active: Option<bool>,
}

/// Catalog listing filters
#[derive(Debug, Clone, Default)]
pub struct AchievementFilter {
    pub category: Option<String>,
    pub rarity: Option<String>,
    pub include_hidden: bool,
}
