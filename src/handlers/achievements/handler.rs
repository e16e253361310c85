//! Achievement handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    handlers::common::ApiResponse,
    middleware::{AdminUser, AuthenticatedUser, OptionalAuth},
    state::AppState,
    utils::ValidatedJson,
};

use super::{
    request::{CreateAchievementRequest, ListAchievementsQuery, UpdateAchievementRequest},
    response::{AchievementResponse, UnlockedAchievementResponse},
};

/// Catalog. Hidden achievements are included for admins.
pub async fn list_achievements(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Query(query): Query<ListAchievementsQuery>,
) -> AppResult<ApiResponse<Vec<AchievementResponse>>> {
    let is_admin = viewer.as_ref().is_some_and(|v| v.is_admin());
    let achievements = state
        .services()
        .achievements
        .list(query.into_filter(is_admin))
        .await?;

    Ok(ApiResponse::ok(achievements.into_iter().map(Into::into).collect()))
}

pub async fn get_achievement(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<AchievementResponse>> {
    let is_admin = viewer.as_ref().is_some_and(|v| v.is_admin());
    let achievement = state.services().achievements.get(id, is_admin).await?;
    Ok(ApiResponse::ok(achievement.into()))
}

/// The caller's unlocked achievements, newest first
pub async fn my_achievements(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<ApiResponse<Vec<UnlockedAchievementResponse>>> {
    let unlocked = state
        .services()
        .achievements
        .user_achievements(auth_user.id)
        .await?;

    Ok(ApiResponse::ok(unlocked.into_iter().map(Into::into).collect()))
}

pub async fn create_achievement(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateAchievementRequest>,
) -> AppResult<(StatusCode, ApiResponse<AchievementResponse>)> {
    let achievement = state.services().achievements.create(payload.into()).await?;
    tracing::debug!(admin_id = %admin.id, achievement_id = %achievement.id, "Achievement created by admin");

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(achievement.into(), "Achievement created"),
    ))
}

pub async fn update_achievement(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateAchievementRequest>,
) -> AppResult<ApiResponse<AchievementResponse>> {
    let achievement = state
        .services()
        .achievements
        .update(id, payload.into())
        .await?;

    Ok(ApiResponse::with_message(achievement.into(), "Achievement updated"))
}

pub async fn delete_achievement(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    state.services().achievements.delete(id).await?;
    Ok(ApiResponse::message("Achievement deleted"))
}
