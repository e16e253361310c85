//! Submission handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Submission routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_submissions).post(handler::submit_code))
        .route("/recent", get(handler::recent_submissions))
        .route(
            "/{id}",
            get(handler::get_submission).delete(handler::delete_submission),
        )
        .route("/{id}/results", post(handler::submit_results))
}
