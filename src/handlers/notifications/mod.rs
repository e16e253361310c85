//! Notification inbox handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{middleware::auth_middleware, state::AppState};

/// Notification routes. Every route requires authentication.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_notifications))
        .route("/count", get(handler::unread_count))
        .route("/stats", get(handler::stats))
        .route("/read-all", put(handler::mark_all_read))
        .route("/bulk", post(handler::send_bulk))
        .route("/{id}/read", put(handler::mark_read))
        .route("/{id}", delete(handler::delete_notification))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
