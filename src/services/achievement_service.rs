//! Achievement service
//!
//! Owns the catalog and the unlock ledger. Unlocking is optimistic: a
//! pre-check skips achievements the user already holds, and the unique
//! (user, achievement) index rejects whatever slips past it concurrently.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    constants::{channels, criteria_types, notification_types, priorities},
    db::repositories::{AchievementRepository, SubmissionRepository},
    error::{AppError, AppResult},
    models::{
        Achievement, AchievementChanges, AchievementFilter, NewAchievement, NotificationDraft,
        Submission, UserAchievement, XpAward,
    },
    services::{
        achievement_rules::{self, CatalogKey, UnlockContext},
        BestEffort, NotificationService, UserService,
    },
};

/// Achievement catalog and unlock logic
pub struct AchievementService {
    achievements: Arc<dyn AchievementRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    users: Arc<UserService>,
    notifications: Arc<NotificationService>,
}

impl AchievementService {
    pub fn new(
        achievements: Arc<dyn AchievementRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        users: Arc<UserService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            achievements,
            submissions,
            users,
            notifications,
        }
    }

    /// Evaluate the submission rule battery and unlock everything newly
    /// earned. Failures are logged and never reach the caller.
    pub async fn check_submission_achievements(&self, user_id: Uuid, submission: &Submission) -> Vec<Achievement> {
        let ctx = match self.unlock_context(user_id, submission).await {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    submission_id = %submission.id,
                    error = %e,
                    "Could not evaluate achievements"
                );
                return Vec::new();
            }
        };

        let mut unlocked = Vec::new();
        let mut reached_level = None;
        for rule in achievement_rules::satisfied_rules(&ctx) {
            let Some(achievement) = self
                .lookup(&rule.key)
                .await
                .best_effort("achievement lookup")
                .flatten()
            else {
                continue;
            };

            let metadata = json!({
                "rule": rule.label,
                "submissionId": submission.id,
                "score": submission.score,
            });
            if let Some((achievement, award)) = self
                .unlock(user_id, achievement, metadata)
                .await
                .best_effort("achievement unlock")
                .flatten()
            {
                if let Some(award) = award.filter(XpAward::leveled_up) {
                    reached_level = reached_level.max(Some(award.level));
                }
                unlocked.push(achievement);
            }
        }

        if let Some(level) = reached_level {
            tracing::info!(user_id = %user_id, level, "User leveled up from achievement rewards");
            unlocked.extend(self.check_level_achievements(user_id, level).await);
        }

        if !unlocked.is_empty() {
            tracing::info!(
                user_id = %user_id,
                submission_id = %submission.id,
                count = unlocked.len(),
                "Achievements unlocked"
            );
        }

        unlocked
    }

    /// Grant XP the way scoring does: a level-up evaluates the level
    /// achievements. Failures are logged and never reach the caller.
    pub async fn award_xp(&self, user_id: Uuid, amount: i64) -> (Option<XpAward>, Vec<Achievement>) {
        let award = self.users.award_xp(user_id, amount).await.best_effort("xp award");

        let unlocked = match award.as_ref().filter(|award| award.leveled_up()) {
            Some(award) => {
                tracing::info!(user_id = %user_id, level = award.level, "User leveled up");
                self.check_level_achievements(user_id, award.level).await
            }
            None => Vec::new(),
        };

        (award, unlocked)
    }

    /// Unlock every level achievement at or below `level`. Rewards that push
    /// the user further up are evaluated in the next round.
    pub async fn check_level_achievements(&self, user_id: Uuid, level: i32) -> Vec<Achievement> {
        let mut level = level;
        let mut unlocked = Vec::new();

        loop {
            let candidates = match self.achievements.list_by_criteria_type(criteria_types::SPECIAL).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Could not load level achievements");
                    return unlocked;
                }
            };

            let mut reached = level;
            for achievement in candidates {
                let Some(required) = achievement.required_level() else {
                    continue;
                };
                if required > i64::from(level) {
                    continue;
                }

                let metadata = json!({ "level": level });
                if let Some((achievement, award)) = self
                    .unlock(user_id, achievement, metadata)
                    .await
                    .best_effort("level achievement unlock")
                    .flatten()
                {
                    if let Some(award) = award.filter(XpAward::leveled_up) {
                        reached = reached.max(award.level);
                    }
                    unlocked.push(achievement);
                }
            }

            if reached <= level {
                return unlocked;
            }
            level = reached;
        }
    }

    async fn unlock_context(&self, user_id: Uuid, submission: &Submission) -> AppResult<UnlockContext> {
        let user = self.users.get_user(user_id).await?;
        let completed = self.submissions.count_completed(user_id).await?;
        let in_language = self
            .submissions
            .count_completed_in_language(user_id, &submission.language)
            .await?;

        Ok(UnlockContext::new(submission, completed, in_language, user.streak))
    }

    async fn lookup(&self, key: &CatalogKey) -> AppResult<Option<Achievement>> {
        match key {
            CatalogKey::Name(name) => self.achievements.find_by_name(name).await,
            CatalogKey::Criteria {
                criteria_type,
                target,
            } => self.achievements.find_by_criteria(criteria_type, *target).await,
        }
    }

    /// Record an unlock, grant its XP and notify the user. The XP award is
    /// returned so callers can follow a level-up.
    ///
    /// Returns `Ok(None)` when the user already holds the achievement,
    /// including when a concurrent unlock won the race to the unique index.
    async fn unlock(
        &self,
        user_id: Uuid,
        achievement: Achievement,
        metadata: serde_json::Value,
    ) -> AppResult<Option<(Achievement, Option<XpAward>)>> {
        if self.achievements.user_has(user_id, achievement.id).await? {
            return Ok(None);
        }

        match self
            .achievements
            .insert_unlock(user_id, achievement.id, metadata)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_unique_violation() => {
                tracing::debug!(
                    user_id = %user_id,
                    achievement = %achievement.name,
                    "Achievement already unlocked concurrently"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(user_id = %user_id, achievement = %achievement.name, "Achievement unlocked");

        let award = if achievement.reward_xp > 0 {
            self.users
                .award_xp(user_id, i64::from(achievement.reward_xp))
                .await
                .best_effort("achievement xp")
        } else {
            None
        };

        self.notifications
            .send(user_id, &unlock_notification(&achievement))
            .await
            .best_effort("achievement notification");

        Ok(Some((achievement, award)))
    }

    /// Visible catalog. Hidden achievements are listed for admins only.
    pub async fn list(&self, filter: AchievementFilter) -> AppResult<Vec<Achievement>> {
        self.achievements.list(filter).await
    }

    pub async fn get(&self, id: Uuid, viewer_is_admin: bool) -> AppResult<Achievement> {
        self.achievements
            .find_by_id(id)
            .await?
            .filter(|a| viewer_is_admin || (a.is_active && !a.is_hidden))
            .ok_or_else(|| AppError::NotFound("Achievement not found".to_string()))
    }

    pub async fn create(&self, achievement: NewAchievement) -> AppResult<Achievement> {
        let name = achievement.name.clone();
        let created = self.achievements.create(achievement).await.map_err(|e| {
            if e.is_unique_violation() {
                AppError::Conflict(format!("Achievement '{}' already exists", name))
            } else {
                e
            }
        })?;

        tracing::info!(achievement_id = %created.id, name = %created.name, "Achievement created");
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, changes: AchievementChanges) -> AppResult<Achievement> {
        self.get(id, true).await?;
        self.achievements.update(id, changes).await
    }

    /// Retire an achievement. Existing unlocks are kept.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get(id, true).await?;
        self.achievements.deactivate(id).await?;
        tracing::info!(achievement_id = %id, "Achievement deactivated");
        Ok(())
    }

    /// Achievements unlocked by a user, newest first
    pub async fn user_achievements(&self, user_id: Uuid) -> AppResult<Vec<(UserAchievement, Achievement)>> {
        self.achievements.list_unlocked(user_id).await
    }
}

fn unlock_notification(achievement: &Achievement) -> NotificationDraft {
    let priority = match achievement.rarity.as_str() {
        "epic" | "legendary" => priorities::HIGH,
        _ => priorities::NORMAL,
    };

    NotificationDraft {
        notification_type: notification_types::ACHIEVEMENT.to_string(),
        title: "Achievement unlocked!".to_string(),
        message: format!("You earned \"{}\": {}", achievement.name, achievement.description),
        data: json!({
            "achievementId": achievement.id,
            "name": achievement.name,
            "icon": achievement.icon,
            "rarity": achievement.rarity,
            "rewardXp": achievement.reward_xp,
        }),
        priority: priority.to_string(),
        channels: vec![channels::PUSH.to_string(), channels::EMAIL.to_string()],
        expires_at: None,
    }
}
