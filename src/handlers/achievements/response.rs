//! Achievement response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Achievement, UserAchievement};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub category: String,
    pub criteria: CriteriaResponse,
    pub rewards: RewardsResponse,
    pub rarity: String,
    pub is_hidden: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaResponse {
    #[serde(rename = "type")]
    pub criteria_type: String,
    pub target: i64,
    pub conditions: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsResponse {
    pub xp: i32,
    pub badge: Option<String>,
    pub title: Option<String>,
}

impl From<Achievement> for AchievementResponse {
    fn from(a: Achievement) -> Self {
        Self {
            id: a.id,
            name: a.name,
            description: a.description,
            icon: a.icon,
            category: a.category,
            criteria: CriteriaResponse {
                criteria_type: a.criteria_type,
                target: a.criteria_target,
                conditions: a.criteria_conditions.0,
            },
            rewards: RewardsResponse {
                xp: a.reward_xp,
                badge: a.reward_badge,
                title: a.reward_title,
            },
            rarity: a.rarity,
            is_hidden: a.is_hidden,
            is_active: a.is_active,
            created_at: a.created_at,
        }
    }
}

/// One entry of a user's achievement ledger
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievementResponse {
    pub achievement: AchievementResponse,
    pub unlocked_at: DateTime<Utc>,
    pub progress: i32,
    pub metadata: Value,
}

impl From<(UserAchievement, Achievement)> for UnlockedAchievementResponse {
    fn from((unlock, achievement): (UserAchievement, Achievement)) -> Self {
        Self {
            achievement: achievement.into(),
            unlocked_at: unlock.unlocked_at,
            progress: unlock.progress,
            metadata: unlock.metadata.0,
        }
    }
}
