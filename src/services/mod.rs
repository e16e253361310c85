//! Business logic services

pub mod achievement_rules;
pub mod achievement_service;
pub mod auth_service;
pub mod challenge_service;
pub mod delivery;
pub mod notification_service;
pub mod scoring;
pub mod submission_service;
pub mod user_service;

use std::sync::Arc;

pub use achievement_service::AchievementService;
pub use auth_service::AuthService;
pub use challenge_service::ChallengeService;
pub use notification_service::NotificationService;
pub use submission_service::SubmissionService;
pub use user_service::UserService;

use uuid::Uuid;

use crate::{config::Config, db::Repositories, error::AppResult};

/// Who is asking, for ownership checks
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub id: Uuid,
    pub is_admin: bool,
}

impl Requester {
    /// Owners and admins pass
    pub fn may_manage(&self, owner_id: Uuid) -> bool {
        self.is_admin || self.id == owner_id
    }
}

/// Secondary effects whose failure must not fail the operation that
/// triggered them
pub(crate) trait BestEffort<T> {
    /// Log the error under `effect` and discard it
    fn best_effort(self, effect: &str) -> Option<T>;
}

impl<T> BestEffort<T> for AppResult<T> {
    fn best_effort(self, effect: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(effect, error = %e, "Side effect failed");
                None
            }
        }
    }
}

/// Every service, wired over one set of repositories
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub challenges: Arc<ChallengeService>,
    pub submissions: Arc<SubmissionService>,
    pub achievements: Arc<AchievementService>,
    pub notifications: Arc<NotificationService>,
}

impl Services {
    pub fn new(repos: Repositories, config: &Config) -> Self {
        let users = Arc::new(UserService::new(repos.users.clone()));
        let notifications = Arc::new(NotificationService::with_default_channels(
            repos.users.clone(),
            repos.notifications.clone(),
        ));
        let achievements = Arc::new(AchievementService::new(
            repos.achievements.clone(),
            repos.submissions.clone(),
            users.clone(),
            notifications.clone(),
        ));
        let submissions = Arc::new(SubmissionService::new(
            repos.submissions.clone(),
            repos.challenges.clone(),
            repos.users.clone(),
            users.clone(),
            achievements.clone(),
        ));

        Self {
            auth: Arc::new(AuthService::new(
                repos.users.clone(),
                config.jwt.clone(),
                config.security.clone(),
            )),
            users,
            challenges: Arc::new(ChallengeService::new(repos.challenges)),
            submissions,
            achievements,
            notifications,
        }
    }
}
