//! Authentication service

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{JwtConfig, SecurityConfig},
    constants::{ACCOUNT_LOCK_HOURS, ACCOUNT_TOKEN_LENGTH, MAX_LOGIN_ATTEMPTS, PASSWORD_RESET_EXPIRY_MINUTES},
    db::repositories::UserRepository,
    error::{AppError, AppResult},
    models::{NewUser, Profile, User},
    utils::crypto,
};

/// Which secret a token is signed with and what it may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
}

/// Access and refresh token pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Sign-up details. Field rules are enforced by the request DTO.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A freshly registered account
#[derive(Debug, Clone)]
pub struct Registered {
    pub user: User,
    pub tokens: TokenPair,
    /// Raw email verification token, for the mailer only
    pub verification_token: String,
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: JwtConfig,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtConfig, security: SecurityConfig) -> Self {
        Self { users, jwt, security }
    }

    /// Register a new user
    pub async fn register(&self, registration: Registration) -> AppResult<Registered> {
        let email = registration.email.trim().to_lowercase();

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailExists);
        }
        if self.users.find_by_username(&registration.username).await?.is_some() {
            return Err(AppError::UsernameExists);
        }

        let password_hash = crypto::hash_password(&registration.password, self.security.password_hash_cost)?;
        let verification_token = crypto::generate_secure_token(ACCOUNT_TOKEN_LENGTH);

        let user = self
            .users
            .create(NewUser {
                username: registration.username,
                email,
                password_hash,
                profile: Profile {
                    first_name: registration.first_name,
                    last_name: registration.last_name,
                    ..Default::default()
                },
                email_verification_token: Some(crypto::hash_token(&verification_token)),
            })
            .await
            .map_err(|e| match e {
                // lost a race against a concurrent sign-up
                AppError::AlreadyExists(constraint) if constraint.contains("email") => AppError::EmailExists,
                AppError::AlreadyExists(_) => AppError::UsernameExists,
                other => other,
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        tracing::info!(user_id = %user.id, to = %user.email, "Verification email queued");

        let tokens = self.issue_tokens(&user)?;
        Ok(Registered {
            user,
            tokens,
            verification_token,
        })
    }

    /// Login with username or email
    pub async fn login(&self, identifier: &str, password: &str, now: DateTime<Utc>) -> AppResult<(User, TokenPair)> {
        let identifier = identifier.trim();
        let mut user = self
            .users
            .find_by_identifier(identifier)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if user.is_locked(now) {
            return Err(AppError::AccountLocked);
        }
        if user.lock_until.is_some() {
            // lock has lapsed; failures start counting afresh
            self.users.reset_login_attempts(user.id).await?;
        }

        if !crypto::verify_password(password, &user.password_hash)? {
            let attempts = self.users.increment_login_attempts(user.id).await?;
            if attempts >= MAX_LOGIN_ATTEMPTS {
                self.users
                    .lock_until(user.id, now + Duration::hours(ACCOUNT_LOCK_HOURS))
                    .await?;
                tracing::warn!(user_id = %user.id, attempts, "Account locked after failed logins");
            }
            return Err(AppError::InvalidCredentials);
        }

        self.users.record_login(user.id, now).await?;
        user.login_attempts = 0;
        user.lock_until = None;
        user.last_login_at = Some(now);

        tracing::info!(user_id = %user.id, "User logged in");

        let tokens = self.issue_tokens(&user)?;
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.verify(refresh_token, TokenType::Refresh)?;
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        self.issue_tokens(&user)
    }

    /// Tokens are stateless; there is nothing to revoke server-side.
    pub fn logout(&self, user_id: Uuid) {
        tracing::debug!(user_id = %user_id, "User logged out");
    }

    /// Start a password reset. Returns the raw reset token when the email
    /// belongs to an active account; callers must not reveal which case hit.
    pub async fn forgot_password(&self, email: &str, now: DateTime<Utc>) -> AppResult<Option<String>> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await?.filter(|u| u.is_active) else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = crypto::generate_secure_token(ACCOUNT_TOKEN_LENGTH);
        self.users
            .set_reset_token(
                user.id,
                &crypto::hash_token(&token),
                now + Duration::minutes(PASSWORD_RESET_EXPIRY_MINUTES),
            )
            .await?;

        tracing::info!(user_id = %user.id, to = %user.email, "Password reset email queued");
        Ok(Some(token))
    }

    pub async fn reset_password(&self, token: &str, new_password: &str, now: DateTime<Utc>) -> AppResult<()> {
        let user = self
            .users
            .find_by_reset_token(&crypto::hash_token(token), now)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let hash = crypto::hash_password(new_password, self.security.password_hash_cost)?;
        self.users.set_password(user.id, &hash).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> AppResult<()> {
        let user = self
            .users
            .find_by_verification_token(&crypto::hash_token(token))
            .await?
            .ok_or(AppError::InvalidToken)?;

        self.users.mark_email_verified(user.id).await?;
        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }

    pub async fn change_password(&self, user_id: Uuid, current: &str, new_password: &str) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !crypto::verify_password(current, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let hash = crypto::hash_password(new_password, self.security.password_hash_cost)?;
        self.users.set_password(user.id, &hash).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Verify an access token and extract its claims
    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, TokenType::Access)
    }

    fn verify(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let secret = match expected {
            TokenType::Access => &self.jwt.access_secret,
            TokenType::Refresh => &self.jwt.refresh_secret,
        };

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        if data.claims.token_type != expected {
            return Err(AppError::InvalidToken);
        }

        Ok(data.claims)
    }

    fn issue_tokens(&self, user: &User) -> AppResult<TokenPair> {
        let now = Utc::now();
        let access_ttl = Duration::minutes(self.jwt.access_expiry_minutes);
        let refresh_ttl = Duration::days(self.jwt.refresh_expiry_days);

        Ok(TokenPair {
            access_token: self.sign(user, TokenType::Access, now, access_ttl)?,
            refresh_token: self.sign(user, TokenType::Refresh, now, refresh_ttl)?,
            expires_in: access_ttl.num_seconds(),
        })
    }

    fn sign(&self, user: &User, token_type: TokenType, now: DateTime<Utc>, ttl: Duration) -> AppResult<String> {
        let secret = match token_type {
            TokenType::Access => &self.jwt.access_secret,
            TokenType::Refresh => &self.jwt.refresh_secret,
        };

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            token_type,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {}", e)))
    }
}
