//! Submission handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    handlers::common::{ApiResponse, Pagination},
    middleware::AuthenticatedUser,
    state::AppState,
    utils::ValidatedJson,
};

use super::{
    request::{ExecutionResultsRequest, ListSubmissionsQuery, RecentQuery, SubmitCodeRequest},
    response::{GradedSubmissionResponse, SubmissionResponse},
};

/// Create a pending submission
pub async fn submit_code(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<SubmitCodeRequest>,
) -> AppResult<(StatusCode, ApiResponse<SubmissionResponse>)> {
    let submission = state
        .services()
        .submissions
        .submit_code(auth_user.id, payload.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(submission.into(), "Submission received"),
    ))
}

/// Grade a submission from the client's execution results
pub async fn submit_results(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ExecutionResultsRequest>,
) -> AppResult<ApiResponse<GradedSubmissionResponse>> {
    let graded = state
        .services()
        .submissions
        .process_execution_results(id, auth_user.id, payload.into())
        .await?;

    Ok(ApiResponse::ok(graded.into()))
}

pub async fn get_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<SubmissionResponse>> {
    let submission = state
        .services()
        .submissions
        .get(id, auth_user.requester())
        .await?;

    Ok(ApiResponse::ok(submission.into()))
}

pub async fn list_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<ApiResponse<Vec<SubmissionResponse>>> {
    let (query, page) = query.into_parts();
    let (page, limit) = page.resolve();

    let (submissions, total) = state
        .services()
        .submissions
        .list(auth_user.requester(), query, page, limit)
        .await?;

    Ok(ApiResponse::paginated(
        submissions.into_iter().map(Into::into).collect(),
        Pagination::new(page, limit, total),
    ))
}

pub async fn recent_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<RecentQuery>,
) -> AppResult<ApiResponse<Vec<SubmissionResponse>>> {
    let submissions = state
        .services()
        .submissions
        .recent(auth_user.id, query.limit)
        .await?;

    Ok(ApiResponse::ok(submissions.into_iter().map(Into::into).collect()))
}

pub async fn delete_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    state.services().submissions.delete(id, auth_user.id).await?;
    Ok(ApiResponse::message("Submission deleted"))
}
