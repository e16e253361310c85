//! Challenge response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Challenge, ChallengeCode, ChallengeContent, Scenario};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(rename = "type")]
    pub challenge_type: String,
    pub difficulty: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub content: ChallengeContent,
    pub code: ChallengeCode,
    pub scenario: Scenario,
    /// Minutes
    pub time_limit: i32,
    pub stats: ChallengeStats,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStats {
    pub total_attempts: i32,
    pub successful_attempts: i32,
    pub completion_rate: f64,
    pub average_time: f64,
    pub average_score: f64,
    pub popularity_score: f64,
}

impl From<Challenge> for ChallengeResponse {
    fn from(c: Challenge) -> Self {
        let stats = ChallengeStats {
            total_attempts: c.total_attempts,
            successful_attempts: c.successful_attempts,
            completion_rate: c.completion_rate(),
            average_time: c.average_time,
            average_score: c.average_score,
            popularity_score: c.popularity_score,
        };

        Self {
            id: c.id,
            title: c.title,
            slug: c.slug,
            description: c.description,
            challenge_type: c.challenge_type,
            difficulty: c.difficulty,
            category: c.category,
            tags: c.tags,
            content: c.content.0,
            code: c.code.0,
            scenario: c.scenario.0,
            time_limit: c.time_limit_minutes,
            stats,
            author_id: c.author_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
