//! Achievement request DTOs

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::{
    models::{AchievementChanges, AchievementFilter, NewAchievement},
    utils::validation::{validate_achievement_category, validate_criteria_type, validate_rarity},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAchievementRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 500))]
    pub description: String,

    pub icon: Option<String>,

    #[validate(custom(function = "validate_achievement_category"))]
    pub category: String,

    #[validate(nested)]
    pub criteria: CriteriaRequest,

    #[serde(default)]
    #[validate(nested)]
    pub rewards: RewardsRequest,

    #[validate(custom(function = "validate_rarity"))]
    pub rarity: String,

    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CriteriaRequest {
    #[serde(rename = "type")]
    #[validate(custom(function = "validate_criteria_type"))]
    pub criteria_type: String,

    #[validate(range(min = 0))]
    pub target: i64,

    #[serde(default = "empty_conditions")]
    pub conditions: Value,
}

fn empty_conditions() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RewardsRequest {
    #[serde(default)]
    #[validate(range(min = 0))]
    pub xp: i32,
    pub badge: Option<String>,
    pub title: Option<String>,
}

impl From<CreateAchievementRequest> for NewAchievement {
    fn from(req: CreateAchievementRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            icon: req.icon,
            category: req.category,
            criteria_type: req.criteria.criteria_type,
            criteria_target: req.criteria.target,
            criteria_conditions: req.criteria.conditions,
            reward_xp: req.rewards.xp,
            reward_badge: req.rewards.badge,
            reward_title: req.rewards.title,
            rarity: req.rarity,
            is_hidden: req.is_hidden,
        }
    }
}

/// Partial update. The criteria type and the name cannot change.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAchievementRequest {
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,

    pub icon: Option<String>,

    #[validate(custom(function = "validate_achievement_category"))]
    pub category: Option<String>,

    #[validate(range(min = 0))]
    pub target: Option<i64>,

    pub conditions: Option<Value>,

    #[validate(range(min = 0))]
    pub reward_xp: Option<i32>,

    pub reward_badge: Option<String>,
    pub reward_title: Option<String>,

    #[validate(custom(function = "validate_rarity"))]
    pub rarity: Option<String>,

    pub is_hidden: Option<bool>,
    pub is_active: Option<bool>,
}

impl From<UpdateAchievementRequest> for AchievementChanges {
    fn from(req: UpdateAchievementRequest) -> Self {
        Self {
            description: req.description,
            icon: req.icon,
            category: req.category,
            criteria_target: req.target,
            criteria_conditions: req.conditions,
            reward_xp: req.reward_xp,
            reward_badge: req.reward_badge,
            reward_title: req.reward_title,
            rarity: req.rarity,
            is_hidden: req.is_hidden,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAchievementsQuery {
    pub category: Option<String>,
    pub rarity: Option<String>,
}

impl ListAchievementsQuery {
    pub fn into_filter(self, include_hidden: bool) -> AchievementFilter {
        AchievementFilter {
            category: self.category,
            rarity: self.rarity,
            include_hidden,
        }
    }
}
