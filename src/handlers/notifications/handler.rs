//! Notification inbox handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    handlers::common::{ApiResponse, Pagination},
    middleware::{AdminUser, AuthenticatedUser},
    models::NotificationStats,
    state::AppState,
    utils::ValidatedJson,
};

use super::{
    request::{BulkNotificationRequest, ListNotificationsQuery},
    response::{BulkResultResponse, NotificationResponse, UnreadCountResponse, UpdatedCountResponse},
};

pub async fn list_notifications(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let (filter, page) = query.into_parts();
    let (page, limit) = page.resolve();

    let (notifications, total) = state
        .services()
        .notifications
        .list(auth_user.id, filter, page, limit)
        .await?;

    Ok(ApiResponse::paginated(
        notifications.into_iter().map(Into::into).collect(),
        Pagination::new(page, limit, total),
    ))
}

pub async fn unread_count(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let unread = state.services().notifications.unread_count(auth_user.id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { unread }))
}

pub async fn stats(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<ApiResponse<NotificationStats>> {
    let stats = state.services().notifications.stats(auth_user.id).await?;
    Ok(ApiResponse::ok(stats))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    let notification = state.services().notifications.mark_read(id, auth_user.id).await?;
    Ok(ApiResponse::ok(notification.into()))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<ApiResponse<UpdatedCountResponse>> {
    let updated = state.services().notifications.mark_all_read(auth_user.id).await?;
    Ok(ApiResponse::ok(UpdatedCountResponse { updated }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    state.services().notifications.delete(id, auth_user.id).await?;
    Ok(ApiResponse::message("Notification deleted"))
}

/// Admin: send one notification to many users, honouring their preferences
pub async fn send_bulk(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ValidatedJson(payload): ValidatedJson<BulkNotificationRequest>,
) -> (StatusCode, ApiResponse<BulkResultResponse>) {
    let (recipients, draft) = payload.into_parts();
    let created = state
        .services()
        .notifications
        .send_bulk(&recipients, &draft)
        .await;

    (
        StatusCode::CREATED,
        ApiResponse::ok(BulkResultResponse {
            requested: recipients.len(),
            created,
        }),
    )
}
