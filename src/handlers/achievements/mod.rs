//! Achievement catalog and ledger handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Achievement routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_achievements).post(handler::create_achievement))
        .route("/user/me", get(handler::my_achievements))
        .route(
            "/{id}",
            get(handler::get_achievement)
                .put(handler::update_achievement)
                .delete(handler::delete_achievement),
        )
}
