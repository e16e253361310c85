//! Challenge request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::{
    constants::{MAX_CHALLENGE_DESCRIPTION_LENGTH, MAX_CHALLENGE_TITLE_LENGTH},
    handlers::common::PageQuery,
    models::{ChallengeChanges, ChallengeCode, ChallengeContent, ChallengeFilter, Scenario},
    services::challenge_service::ChallengeDraft,
    utils::validation::{validate_challenge_type, validate_difficulty},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeRequest {
    #[validate(length(min = 3, max = MAX_CHALLENGE_TITLE_LENGTH))]
    pub title: String,

    #[validate(length(min = 1, max = MAX_CHALLENGE_DESCRIPTION_LENGTH))]
    pub description: String,

    #[serde(rename = "type")]
    #[validate(custom(function = "validate_challenge_type"))]
    pub challenge_type: String,

    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: String,

    #[validate(length(max = 50))]
    pub category: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub content: ChallengeContent,

    #[serde(default)]
    pub code: ChallengeCode,

    #[serde(default)]
    pub scenario: Scenario,

    /// Minutes
    #[validate(range(min = 1, max = 240))]
    pub time_limit: Option<i32>,
}

impl From<CreateChallengeRequest> for ChallengeDraft {
    fn from(req: CreateChallengeRequest) -> Self {
        Self {
            title: req.title.trim().to_string(),
            description: req.description,
            challenge_type: req.challenge_type,
            difficulty: req.difficulty,
            category: req.category,
            tags: req.tags,
            content: req.content,
            code: req.code,
            scenario: req.scenario,
            time_limit_minutes: req.time_limit,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChallengeRequest {
    #[validate(length(min = 3, max = MAX_CHALLENGE_TITLE_LENGTH))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = MAX_CHALLENGE_DESCRIPTION_LENGTH))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: Option<String>,

    #[validate(length(max = 50))]
    pub category: Option<String>,

    pub tags: Option<Vec<String>>,
    pub content: Option<ChallengeContent>,
    pub code: Option<ChallengeCode>,
    pub scenario: Option<Scenario>,

    #[validate(range(min = 1, max = 240))]
    pub time_limit: Option<i32>,
}

impl From<UpdateChallengeRequest> for ChallengeChanges {
    fn from(req: UpdateChallengeRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            difficulty: req.difficulty,
            category: req.category,
            tags: req.tags,
            content: req.content,
            code: req.code,
            scenario: req.scenario,
            time_limit_minutes: req.time_limit,
        }
    }
}

/// `GET /challenges` query
#[derive(Debug, Default, Deserialize)]
pub struct ListChallengesQuery {
    #[serde(rename = "type")]
    pub challenge_type: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListChallengesQuery {
    pub fn into_parts(self) -> (ChallengeFilter, PageQuery) {
        (
            ChallengeFilter {
                challenge_type: self.challenge_type,
                difficulty: self.difficulty,
                category: self.category,
                search: self.search.filter(|s| !s.trim().is_empty()),
            },
            PageQuery {
                page: self.page,
                limit: self.limit,
            },
        )
    }
}
