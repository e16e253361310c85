//! Bearer-token authentication
//!
//! Protected routers can run [`auth_middleware`] as a route layer; the
//! extractors also verify the token themselves when no layer ran first.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    constants::roles,
    error::{AppError, AppResult},
    services::{auth_service::Claims, Requester},
    state::AppState,
};

/// Authenticated user taken from a verified access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == roles::ADMIN
    }

    pub fn requester(&self) -> Requester {
        Requester {
            id: self.id,
            is_admin: self.is_admin(),
        }
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(headers: &HeaderMap, state: &AppState) -> AppResult<AuthenticatedUser> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = state.services().auth.verify_access_token(token)?;
    Ok(claims.into())
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        authenticate(&parts.headers, state).inspect_err(|e| {
            debug!(path = %parts.uri.path(), error = %e, "Authentication failed");
        })
    }
}

/// Authenticated user holding the admin role
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

/// Optional authenticated user (never fails; a bad token counts as anonymous)
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(
            AuthenticatedUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

/// Reject unauthenticated requests and store the user for the extractors
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(request.headers(), &state).inspect_err(|e| {
        debug!(path = %request.uri().path(), error = %e, "Authentication failed");
    })?;

    debug!(user_id = %user.id, role = %user.role, "Request authenticated");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
