//! Health check handlers

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::{db, state::AppState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Health check endpoint; 503 when the database is unreachable
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_up = match db::ping(state.db()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            false
        }
    };

    let (status, body) = if database_up {
        (StatusCode::OK, ("healthy", "up"))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, ("degraded", "down"))
    };

    (
        status,
        Json(HealthResponse {
            status: body.0,
            version: env!("CARGO_PKG_VERSION"),
            database: body.1,
        }),
    )
}

/// Health routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
