//! Challenge catalog service

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    constants::DEFAULT_CHALLENGE_TIME_LIMIT_MINUTES,
    db::repositories::ChallengeRepository,
    error::{AppError, AppResult, FieldError},
    models::{
        slugify, Challenge, ChallengeChanges, ChallengeCode, ChallengeContent, ChallengeFilter,
        NewChallenge, Scenario,
    },
    services::Requester,
};

/// Challenge authoring input. Field rules are enforced by the request DTO.
#[derive(Debug, Clone, Default)]
pub struct ChallengeDraft {
    pub title: String,
    pub description: String,
    pub challenge_type: String,
    pub difficulty: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub content: ChallengeContent,
    pub code: ChallengeCode,
    pub scenario: Scenario,
    pub time_limit_minutes: Option<i32>,
}

/// Challenge catalog management
pub struct ChallengeService {
    challenges: Arc<dyn ChallengeRepository>,
}

impl ChallengeService {
    pub fn new(challenges: Arc<dyn ChallengeRepository>) -> Self {
        Self { challenges }
    }

    /// Create a challenge authored by `author_id` under a unique slug
    pub async fn create(&self, author_id: Uuid, draft: ChallengeDraft) -> AppResult<Challenge> {
        let slug = self.unique_slug(&draft.title).await?;

        let challenge = self
            .challenges
            .create(NewChallenge {
                title: draft.title,
                slug,
                description: draft.description,
                challenge_type: draft.challenge_type,
                difficulty: draft.difficulty,
                category: draft.category,
                tags: draft.tags,
                content: draft.content,
                code: draft.code,
                scenario: draft.scenario,
                time_limit_minutes: draft
                    .time_limit_minutes
                    .unwrap_or(DEFAULT_CHALLENGE_TIME_LIMIT_MINUTES),
                author_id,
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AppError::Conflict("A challenge with this slug was just created, try again".to_string())
                } else {
                    e
                }
            })?;

        tracing::info!(challenge_id = %challenge.id, slug = %challenge.slug, author_id = %author_id, "Challenge created");
        Ok(challenge)
    }

    /// First free slug among `base`, `base-2`, `base-3`, ...
    async fn unique_slug(&self, title: &str) -> AppResult<String> {
        let base = slugify(title);
        if base.is_empty() {
            return Err(AppError::Validation(vec![FieldError {
                field: "title".to_string(),
                message: "Title must contain at least one letter or digit".to_string(),
            }]));
        }

        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.challenges.slug_exists(&candidate).await? {
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }

        Ok(candidate)
    }

    /// Look a challenge up by id or slug, redacted for the viewer
    pub async fn get(&self, id_or_slug: &str, viewer_id: Option<Uuid>, viewer_is_admin: bool) -> AppResult<Challenge> {
        let found = match Uuid::parse_str(id_or_slug) {
            Ok(id) => self.challenges.find_by_id(id).await?,
            Err(_) => self.challenges.find_by_slug(id_or_slug).await?,
        };

        found
            .map(|c| redact_for(c, viewer_id, viewer_is_admin))
            .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))
    }

    pub async fn list(
        &self,
        filter: ChallengeFilter,
        page: u32,
        per_page: u32,
        viewer_id: Option<Uuid>,
        viewer_is_admin: bool,
    ) -> AppResult<(Vec<Challenge>, i64)> {
        let offset = (page.saturating_sub(1) * per_page) as i64;
        let (challenges, total) = self.challenges.list(filter, offset, per_page as i64).await?;

        let challenges = challenges
            .into_iter()
            .map(|c| redact_for(c, viewer_id, viewer_is_admin))
            .collect();

        Ok((challenges, total))
    }

    /// Update a challenge. The slug is kept even when the title changes.
    pub async fn update(&self, id: Uuid, requester: Requester, changes: ChallengeChanges) -> AppResult<Challenge> {
        self.find_managed(id, requester).await?;
        let challenge = self.challenges.update(id, changes).await?;

        tracing::info!(challenge_id = %id, user_id = %requester.id, "Challenge updated");
        Ok(challenge)
    }

    /// Soft delete
    pub async fn delete(&self, id: Uuid, requester: Requester) -> AppResult<()> {
        self.find_managed(id, requester).await?;
        self.challenges.deactivate(id).await?;

        tracing::info!(challenge_id = %id, user_id = %requester.id, "Challenge deactivated");
        Ok(())
    }

    async fn find_managed(&self, id: Uuid, requester: Requester) -> AppResult<Challenge> {
        let challenge = self
            .challenges
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

        if !requester.may_manage(challenge.author_id) {
            return Err(AppError::Forbidden("Only the author or an admin can modify this challenge".to_string()));
        }

        Ok(challenge)
    }
}

/// Drop the solution and hidden test cases unless the viewer may see them
fn redact_for(mut challenge: Challenge, viewer_id: Option<Uuid>, viewer_is_admin: bool) -> Challenge {
    if !challenge.is_visible_in_full_to(viewer_id, viewer_is_admin) {
        challenge.content.solution = None;
        challenge.code.test_cases.retain(|tc| !tc.is_hidden);
    }
    challenge
}
