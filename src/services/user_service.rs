//! User service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    constants::scoring::XP_PER_LEVEL,
    db::repositories::UserRepository,
    error::{AppError, AppResult},
    models::{level_for_xp, Preferences, Profile, User, XpAward},
    services::scoring,
};

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
    pub preferences: Option<Preferences>,
}

impl ProfileUpdate {
    fn apply(self, profile: &mut Profile) {
        let fields = [
            (self.first_name, &mut profile.first_name),
            (self.last_name, &mut profile.last_name),
            (self.bio, &mut profile.bio),
            (self.avatar, &mut profile.avatar),
            (self.github, &mut profile.github),
            (self.linkedin, &mut profile.linkedin),
            (self.website, &mut profile.website),
        ];
        for (value, slot) in fields {
            if value.is_some() {
                *slot = value;
            }
        }
    }
}

/// Progression summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub level: i32,
    pub xp: i64,
    pub xp_to_next_level: i64,
    pub streak: i32,
    pub total_challenges: i32,
    pub completed_challenges: i32,
    pub completion_rate: f64,
}

impl UserStats {
    pub fn of(user: &User) -> Self {
        let completion_rate = if user.total_challenges == 0 {
            0.0
        } else {
            f64::from(user.completed_challenges) / f64::from(user.total_challenges)
        };

        Self {
            level: user.level,
            xp: user.xp,
            xp_to_next_level: XP_PER_LEVEL - user.xp.rem_euclid(XP_PER_LEVEL),
            streak: user.streak,
            total_challenges: user.total_challenges,
            completed_challenges: user.completed_challenges,
            completion_rate,
        }
    }
}

/// What another user may see of a profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub profile: Profile,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<UserStats>,
    pub created_at: DateTime<Utc>,
}

/// User profile and progression logic
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Get an active user by ID
    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn stats(&self, id: Uuid) -> AppResult<UserStats> {
        let user = self.get_user(id).await?;
        Ok(UserStats::of(&user))
    }

    /// Add XP to a user. Level is recomputed by the same store update, so the
    /// returned level always matches the returned XP.
    pub async fn award_xp(&self, user_id: Uuid, amount: i64) -> AppResult<XpAward> {
        let user = self.get_user(user_id).await?;
        let xp = self.users.add_xp(user_id, amount).await?;
        let award = XpAward {
            awarded: amount,
            xp,
            previous_level: user.level,
            level: level_for_xp(xp),
        };

        tracing::debug!(
            user_id = %user_id,
            awarded = amount,
            xp = award.xp,
            level = award.level,
            "XP awarded"
        );

        Ok(award)
    }

    /// Record activity at `now` and return the resulting streak
    pub async fn update_streak(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<i32> {
        let user = self.get_user(user_id).await?;
        let streak = scoring::next_streak(user.streak, user.last_active_date, now);
        self.users.update_streak(user_id, streak, now).await?;
        Ok(streak)
    }

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let user = self.get_user(user_id).await?;
        let mut profile = user.profile.0;
        let preferences = update.preferences.clone().unwrap_or(user.preferences.0);
        update.apply(&mut profile);

        self.users.update_profile(user_id, profile, preferences).await
    }

    /// Soft-delete the account
    pub async fn deactivate(&self, user_id: Uuid) -> AppResult<()> {
        self.get_user(user_id).await?;
        self.users.deactivate(user_id).await?;
        tracing::info!(user_id = %user_id, "Account deactivated");
        Ok(())
    }

    /// Public view of a profile, honouring the owner's privacy toggles.
    /// Admins and the owner see everything.
    pub async fn public_profile(
        &self,
        username: &str,
        viewer_id: Option<Uuid>,
        viewer_is_admin: bool,
    ) -> AppResult<PublicProfile> {
        let not_found = || AppError::NotFound("User not found".to_string());

        let user = self
            .users
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(not_found)?;

        let privileged = viewer_is_admin || viewer_id == Some(user.id);
        let privacy = &user.preferences.privacy;
        if !privacy.show_profile && !privileged {
            return Err(not_found());
        }

        let stats = (privacy.show_stats || privileged).then(|| UserStats::of(&user));

        Ok(PublicProfile {
            id: user.id,
            username: user.username.clone(),
            profile: user.profile.0.clone(),
            role: user.role.clone(),
            stats,
            created_at: user.created_at,
        })
    }
}
