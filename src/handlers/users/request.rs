//! User request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::{
    models::{NotificationPreferences, Preferences, PrivacyPreferences},
    services::user_service::ProfileUpdate,
    utils::validation::validate_theme,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50))]
    pub first_name: Option<String>,

    #[validate(length(max = 50))]
    pub last_name: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar: Option<String>,

    #[validate(length(max = 100))]
    pub github: Option<String>,

    #[validate(length(max = 100))]
    pub linkedin: Option<String>,

    #[validate(url)]
    pub website: Option<String>,

    #[validate(nested)]
    pub preferences: Option<PreferencesRequest>,
}

/// Preference groups to replace
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRequest {
    #[validate(custom(function = "validate_theme"))]
    pub theme: Option<String>,
    pub notifications: Option<NotificationPreferences>,
    pub privacy: Option<PrivacyPreferences>,
}

impl UpdateProfileRequest {
    /// Preference groups left out of the request keep their `current` values
    pub fn into_update(self, current: &Preferences) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
            avatar: self.avatar,
            github: self.github,
            linkedin: self.linkedin,
            website: self.website,
            preferences: self.preferences.map(|p| Preferences {
                theme: p.theme.unwrap_or_else(|| current.theme.clone()),
                notifications: p.notifications.unwrap_or_else(|| current.notifications.clone()),
                privacy: p.privacy.unwrap_or_else(|| current.privacy.clone()),
            }),
        }
    }
}
