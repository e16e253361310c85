//! Authentication response DTOs

use serde::Serialize;

use crate::{handlers::users::UserResponse, services::auth_service::TokenPair};

/// Tokens plus the account they were issued for
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}
