//! HTTP Request Handlers
//!
//! One module per domain, each exposing `routes()`. [`router`] nests them
//! under the API base path and applies the shared middleware stack.

pub mod achievements;
pub mod auth;
pub mod challenges;
pub mod common;
pub mod health;
pub mod notifications;
pub mod submissions;
pub mod users;

use std::time::Duration;

use axum::{http::StatusCode, middleware, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    constants::{API_BASE_PATH, MAX_REQUEST_BODY_SIZE, REQUEST_TIMEOUT_SECS},
    error::AppError,
    middleware::{error_path_middleware, logging_middleware, rate_limit_middleware},
    state::AppState,
};

/// Create all API routes
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/challenges", challenges::routes())
        .nest("/submissions", submissions::routes())
        .nest("/achievements", achievements::routes())
        .nest("/notifications", notifications::routes(state))
}

/// The complete application: API routes plus middleware, ready to serve
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest(API_BASE_PATH, routes(state.clone()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(middleware::from_fn(error_path_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_SIZE))
        .layer(request_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Requests still running after `after` are answered with 408
fn request_timeout(after: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, after)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
