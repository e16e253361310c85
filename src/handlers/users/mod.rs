//! User profile handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{routing::get, Router};

use crate::state::AppState;

/// User routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(handler::get_me)
                .put(handler::update_me)
                .delete(handler::delete_me),
        )
        .route("/me/stats", get(handler::get_my_stats))
        .route("/{username}", get(handler::get_profile))
}
