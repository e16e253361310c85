//! Challenge handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    handlers::common::{ApiResponse, Pagination},
    middleware::{AuthenticatedUser, OptionalAuth},
    state::AppState,
    utils::ValidatedJson,
};

use super::{
    request::{CreateChallengeRequest, ListChallengesQuery, UpdateChallengeRequest},
    response::ChallengeResponse,
};

pub async fn list_challenges(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Query(query): Query<ListChallengesQuery>,
) -> AppResult<ApiResponse<Vec<ChallengeResponse>>> {
    let (filter, page) = query.into_parts();
    let (page, limit) = page.resolve();

    let (challenges, total) = state
        .services()
        .challenges
        .list(
            filter,
            page,
            limit,
            viewer.as_ref().map(|v| v.id),
            viewer.as_ref().is_some_and(|v| v.is_admin()),
        )
        .await?;

    Ok(ApiResponse::paginated(
        challenges.into_iter().map(Into::into).collect(),
        Pagination::new(page, limit, total),
    ))
}

/// Get by id or slug
pub async fn get_challenge(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(id_or_slug): Path<String>,
) -> AppResult<ApiResponse<ChallengeResponse>> {
    let challenge = state
        .services()
        .challenges
        .get(
            &id_or_slug,
            viewer.as_ref().map(|v| v.id),
            viewer.as_ref().is_some_and(|v| v.is_admin()),
        )
        .await?;

    Ok(ApiResponse::ok(challenge.into()))
}

pub async fn create_challenge(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<CreateChallengeRequest>,
) -> AppResult<(StatusCode, ApiResponse<ChallengeResponse>)> {
    let challenge = state
        .services()
        .challenges
        .create(auth_user.id, payload.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(challenge.into(), "Challenge created"),
    ))
}

pub async fn update_challenge(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateChallengeRequest>,
) -> AppResult<ApiResponse<ChallengeResponse>> {
    let challenge = state
        .services()
        .challenges
        .update(id, auth_user.requester(), payload.into())
        .await?;

    Ok(ApiResponse::with_message(challenge.into(), "Challenge updated"))
}

pub async fn delete_challenge(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    state
        .services()
        .challenges
        .delete(id, auth_user.requester())
        .await?;

    Ok(ApiResponse::message("Challenge deleted"))
}
