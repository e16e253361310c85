//! Authentication handler implementations

use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use crate::{
    error::AppResult,
    handlers::{common::ApiResponse, users::UserResponse},
    middleware::AuthenticatedUser,
    services::{auth_service::TokenPair, BestEffort},
    state::AppState,
    utils::ValidatedJson,
};

use super::{
    request::{
        ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
        ResetPasswordRequest, VerifyEmailRequest,
    },
    response::AuthResponse,
};

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, ApiResponse<AuthResponse>)> {
    let registered = state.services().auth.register(payload.into()).await?;

    tracing::info!(
        user_id = %registered.user.id,
        to = %registered.user.email,
        "Verification email queued"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            AuthResponse {
                user: registered.user.into(),
                tokens: registered.tokens,
            },
            "Registration successful",
        ),
    ))
}

/// Login with username or email
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let (user, tokens) = state
        .services()
        .auth
        .login(&payload.identifier, &payload.password, Utc::now())
        .await?;

    Ok(ApiResponse::ok(AuthResponse {
        user: user.into(),
        tokens,
    }))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshTokenRequest>,
) -> AppResult<ApiResponse<TokenPair>> {
    let tokens = state.services().auth.refresh(&payload.refresh_token).await?;
    Ok(ApiResponse::ok(tokens))
}

pub async fn logout(State(state): State<AppState>, auth_user: AuthenticatedUser) -> ApiResponse<()> {
    state.services().auth.logout(auth_user.id);
    ApiResponse::message("Logged out successfully")
}

/// Always answers the same way, whether or not the email is known and
/// whether or not the reset could be stored
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResponse<()> {
    state
        .services()
        .auth
        .forgot_password(&payload.email, Utc::now())
        .await
        .best_effort("password reset request");

    ApiResponse::message("If that email is registered, a password reset link has been sent")
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .services()
        .auth
        .reset_password(&payload.token, &payload.password, Utc::now())
        .await?;
    Ok(ApiResponse::message("Password has been reset"))
}

pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyEmailRequest>,
) -> AppResult<ApiResponse<()>> {
    state.services().auth.verify_email(&payload.token).await?;
    Ok(ApiResponse::message("Email verified"))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .services()
        .auth
        .change_password(auth_user.id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(ApiResponse::message("Password changed"))
}

/// Current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.services().users.get_user(auth_user.id).await?;
    Ok(ApiResponse::ok(user.into()))
}
