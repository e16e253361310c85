//! Database repositories
//!
//! Repositories handle all direct database interactions. Services depend on
//! the traits so tests can substitute in-memory or mocked stores.

pub mod achievement_repo;
pub mod challenge_repo;
pub mod notification_repo;
pub mod submission_repo;
pub mod user_repo;

use std::sync::Arc;

use sqlx::PgPool;

pub use achievement_repo::{AchievementRepository, PgAchievementRepository};
pub use challenge_repo::{ChallengeRepository, PgChallengeRepository};
pub use notification_repo::{NotificationRepository, PgNotificationRepository};
pub use submission_repo::{PgSubmissionRepository, SubmissionRepository};
pub use user_repo::{PgUserRepository, UserRepository};

/// One handle per record store
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub challenges: Arc<dyn ChallengeRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub achievements: Arc<dyn AchievementRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            challenges: Arc::new(PgChallengeRepository::new(pool.clone())),
            submissions: Arc::new(PgSubmissionRepository::new(pool.clone())),
            achievements: Arc::new(PgAchievementRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool)),
        }
    }
}
