//! Custom error types and handling
//!
//! This module defines the application's error types and implements
//! conversion to HTTP responses for the Axum framework.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is temporarily locked due to too many failed login attempts")]
    AccountLocked,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Resource errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Email already registered")]
    EmailExists,

    #[error("Username already taken")]
    UsernameExists,

    #[error("Conflict: {0}")]
    Conflict(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    // Rate limiting
    #[error("Too many requests")]
    TooManyRequests,

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// A single invalid field in a request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error details in response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Render an error body with the given status. The body is also stored in
    /// the response extensions so outer middleware can enrich it.
    pub fn render(status: StatusCode, body: ErrorBody) -> Response {
        let envelope = ErrorResponse {
            success: false,
            timestamp: body.timestamp,
            error: body.clone(),
        };
        let mut response = (status, Json(envelope)).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::EmailExists => "EMAIL_EXISTS",
            Self::UsernameExists => "USERNAME_EXISTS",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AccountLocked => StatusCode::LOCKED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::EmailExists | Self::UsernameExists | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Redis(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this error is the storage layer rejecting a duplicate row
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors but don't expose details to clients
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                "A cache error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let details = match &self {
            AppError::Validation(fields) => serde_json::to_value(fields).ok(),
            _ => None,
        };

        let body = ErrorBody {
            code: self.error_code(),
            message,
            timestamp: Utc::now(),
            path: None,
            details,
        };

        ErrorResponse::render(status, body)
    }
}

// Implement From for common error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Check for unique constraint violations
                if db_err.is_unique_violation() {
                    AppError::AlreadyExists(
                        db_err
                            .constraint()
                            .unwrap_or("Resource already exists")
                            .to_string(),
                    )
                } else {
                    AppError::Database(db_err.to_string())
                }
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Redis(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors(&err, "", &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }
}

/// Flatten nested validation errors into `parent.child` camelCase paths.
/// Struct-level errors are reported under their error code.
fn collect_field_errors(errors: &validator::ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = |name: &str| {
            if prefix.is_empty() {
                camel_case(name)
            } else {
                format!("{}.{}", prefix, camel_case(name))
            }
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|e| FieldError {
                    field: if *field == "__all__" { path(&e.code) } else { path(field) },
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(nested, &path(field), out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(nested, &format!("{}[{}]", path(field), index), out);
                }
            }
        }
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
