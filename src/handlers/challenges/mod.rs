//! Challenge catalog handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Challenge routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_challenges).post(handler::create_challenge))
        .route(
            "/{id}",
            get(handler::get_challenge)
                .put(handler::update_challenge)
                .delete(handler::delete_challenge),
        )
}
