//! User handler implementations

use axum::extract::{Path, State};

use crate::{
    error::AppResult,
    handlers::common::ApiResponse,
    middleware::{AuthenticatedUser, OptionalAuth},
    services::user_service::{PublicProfile, UserStats},
    state::AppState,
    utils::ValidatedJson,
};

use super::{
    request::UpdateProfileRequest,
    response::{MeResponse, UserResponse},
};

/// Own profile with progression stats
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<ApiResponse<MeResponse>> {
    let user = state.services().users.get_user(auth_user.id).await?;
    let stats = UserStats::of(&user);

    Ok(ApiResponse::ok(MeResponse {
        user: user.into(),
        stats,
    }))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let users = &state.services().users;
    let current = users.get_user(auth_user.id).await?;

    let user = users
        .update_profile(auth_user.id, payload.into_update(&current.preferences))
        .await?;

    Ok(ApiResponse::with_message(user.into(), "Profile updated"))
}

/// Deactivate the caller's account
pub async fn delete_me(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<ApiResponse<()>> {
    state.services().users.deactivate(auth_user.id).await?;
    Ok(ApiResponse::message("Account deactivated"))
}

pub async fn get_my_stats(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<ApiResponse<UserStats>> {
    let stats = state.services().users.stats(auth_user.id).await?;
    Ok(ApiResponse::ok(stats))
}

/// Public profile by username
pub async fn get_profile(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<PublicProfile>> {
    let profile = state
        .services()
        .users
        .public_profile(
            &username,
            viewer.as_ref().map(|v| v.id),
            viewer.as_ref().is_some_and(|v| v.is_admin()),
        )
        .await?;

    Ok(ApiResponse::ok(profile))
}
