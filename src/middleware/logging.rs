//! Request logging and error-body enrichment

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ErrorBody, ErrorResponse};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Log every request with its status and latency, tagging the response with
/// a request id (the caller's, when it sent one)
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut response = next.run(request).await;

    let status = response.status();
    let duration_ms = format!("{:.2}", start.elapsed().as_secs_f64() * 1000.0);

    if status.is_server_error() {
        warn!(%request_id, %method, %path, status = status.as_u16(), %duration_ms, "Request failed");
    } else if status.is_client_error() && status != StatusCode::NOT_FOUND {
        warn!(%request_id, %method, %path, status = status.as_u16(), %duration_ms, "Request rejected");
    } else {
        info!(%request_id, %method, %path, status = status.as_u16(), %duration_ms, "Request completed");
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Re-render error envelopes with the request path filled in
pub async fn error_path_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(body) = response.extensions().get::<ErrorBody>().cloned() else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let mut enriched = ErrorResponse::render(parts.status, ErrorBody { path: Some(path), ..body });

    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_LENGTH && name != header::CONTENT_TYPE {
            enriched.headers_mut().insert(name.clone(), value.clone());
        }
    }
    enriched
}
