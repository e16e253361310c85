//! Fixed-window rate limiting backed by Redis
//!
//! Without a Redis connection the layer lets everything through, and Redis
//! failures let the request through as well.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::{aio::ConnectionManager, AsyncCommands};

use crate::{config::RateLimitConfig, constants::API_BASE_PATH, error::AppError, state::AppState};

/// Which counter a request is charged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub name: &'static str,
    pub max_requests: i64,
    pub window_secs: i64,
}

pub fn bucket_for(path: &str, limits: &RateLimitConfig) -> Bucket {
    let auth_prefix = format!("{}/auth", API_BASE_PATH);
    if path.starts_with(&auth_prefix) {
        Bucket {
            name: "auth",
            max_requests: limits.auth_max_requests,
            window_secs: limits.auth_window_secs,
        }
    } else {
        Bucket {
            name: "general",
            max_requests: limits.max_requests,
            window_secs: limits.window_secs,
        }
    }
}

pub async fn rate_limit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(redis) = state.redis() else {
        return next.run(request).await;
    };

    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let bucket = bucket_for(request.uri().path(), &state.config().rate_limit);
    let key = format!("rate_limit:{}:{}", bucket.name, ip);

    match hit(redis, &key, bucket.window_secs).await {
        Ok(count) if count > bucket.max_requests => {
            tracing::warn!(%ip, bucket = bucket.name, count, "Rate limit exceeded");
            let mut response = AppError::TooManyRequests.into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(bucket.window_secs));
            response
        }
        Ok(_) => next.run(request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Rate limiter unavailable, allowing request");
            next.run(request).await
        }
    }
}

/// Count one request in the current window
async fn hit(mut redis: ConnectionManager, key: &str, window_secs: i64) -> redis::RedisResult<i64> {
    let count: i64 = redis.incr(key, 1).await?;
    if count == 1 {
        let _: () = redis.expire(key, window_secs).await?;
    }
    Ok(count)
}
