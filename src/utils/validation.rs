//! Request validation: the `ValidatedJson` extractor and custom field rules
//! used with `#[validate(custom(function = ...))]`

use std::{borrow::Cow, sync::LazyLock};

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::{
    constants::{
        achievement_categories, challenge_types, channels, criteria_types, difficulties, languages,
        notification_types, priorities, rarities, roles,
    },
    error::AppError,
};

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("static regex"));

/// JSON body that has passed its `Validate` rules.
///
/// Malformed JSON is rejected as `InvalidInput`, rule failures as
/// `Validation` carrying every failing field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn one_of(value: &str, allowed: &[&str], what: &'static str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(invalid(what, format!("Must be one of: {}", allowed.join(", "))))
    }
}

/// Starts with a letter, then letters, digits, underscores or hyphens
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME.is_match(username) {
        Ok(())
    } else {
        Err(invalid(
            "username",
            "Username must start with a letter and contain only letters, numbers, underscores and hyphens",
        ))
    }
}

pub fn validate_language(language: &str) -> Result<(), ValidationError> {
    one_of(language, languages::ALL, "language")
}

pub fn validate_challenge_type(challenge_type: &str) -> Result<(), ValidationError> {
    one_of(challenge_type, challenge_types::ALL, "challenge_type")
}

pub fn validate_difficulty(difficulty: &str) -> Result<(), ValidationError> {
    one_of(difficulty, difficulties::ALL, "difficulty")
}

pub fn validate_theme(theme: &str) -> Result<(), ValidationError> {
    one_of(theme, &["light", "dark", "system"], "theme")
}

pub fn validate_role(role: &str) -> Result<(), ValidationError> {
    one_of(role, roles::ALL, "role")
}

pub fn validate_notification_type(notification_type: &str) -> Result<(), ValidationError> {
    one_of(notification_type, notification_types::ALL, "notification_type")
}

pub fn validate_priority(priority: &str) -> Result<(), ValidationError> {
    one_of(priority, priorities::ALL, "priority")
}

pub fn validate_channels(requested: &[String]) -> Result<(), ValidationError> {
    requested
        .iter()
        .try_for_each(|channel| one_of(channel, channels::ALL, "channel"))
}

pub fn validate_achievement_category(category: &str) -> Result<(), ValidationError> {
    one_of(category, achievement_categories::ALL, "category")
}

pub fn validate_rarity(rarity: &str) -> Result<(), ValidationError> {
    one_of(rarity, rarities::ALL, "rarity")
}

pub fn validate_criteria_type(criteria_type: &str) -> Result<(), ValidationError> {
    one_of(criteria_type, criteria_types::ALL, "criteria_type")
}
