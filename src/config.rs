//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::str::FromStr;

use crate::constants::{
    rate_limits, DEFAULT_ACCESS_TOKEN_EXPIRY_MINUTES, DEFAULT_DATABASE_MAX_CONNECTIONS,
    DEFAULT_NOTIFICATION_CLEANUP_INTERVAL_SECS, DEFAULT_PASSWORD_HASH_COST,
    DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub notifications: NotificationConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Emit JSON log lines instead of the human-readable format
    pub json_logs: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis configuration. Rate limiting is disabled when no URL is set.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
}

/// JWT authentication configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_days: i64,
}

/// Password hashing configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Argon2 iteration count
    pub password_hash_cost: u32,
}

/// Fixed-window rate limits
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_secs: i64,
    pub max_requests: i64,
    pub auth_window_secs: i64,
    pub auth_max_requests: i64,
}

/// Notification housekeeping
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env(),
            jwt: JwtConfig::from_env()?,
            security: SecurityConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            notifications: NotificationConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "stackrush=info,tower_http=info".to_string()),
            json_logs: env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required("DATABASE_URL")?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Self {
        Self {
            url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
        }
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            access_secret: required("JWT_SECRET")?,
            refresh_secret: required("JWT_REFRESH_SECRET")?,
            access_expiry_minutes: parse_or("JWT_EXPIRY_MINUTES", DEFAULT_ACCESS_TOKEN_EXPIRY_MINUTES)?,
            refresh_expiry_days: parse_or("JWT_REFRESH_EXPIRY_DAYS", DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS)?,
        };

        if config.access_secret == config.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "JWT_REFRESH_SECRET must differ from JWT_SECRET".to_string(),
            ));
        }

        Ok(config)
    }
}

impl SecurityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let cost = parse_or("PASSWORD_HASH_COST", DEFAULT_PASSWORD_HASH_COST)?;
        if cost == 0 {
            return Err(ConfigError::InvalidValue("PASSWORD_HASH_COST".to_string()));
        }
        Ok(Self {
            password_hash_cost: cost,
        })
    }
}

impl RateLimitConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", rate_limits::GENERAL_WINDOW_SECS)?,
            max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", rate_limits::GENERAL_MAX_REQUESTS)?,
            auth_window_secs: parse_or("AUTH_RATE_LIMIT_WINDOW_SECS", rate_limits::AUTH_WINDOW_SECS)?,
            auth_max_requests: parse_or("AUTH_RATE_LIMIT_MAX_REQUESTS", rate_limits::AUTH_MAX_REQUESTS)?,
        })
    }
}

impl NotificationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cleanup_interval_secs: parse_or(
                "NOTIFICATION_CLEANUP_INTERVAL_SECS",
                DEFAULT_NOTIFICATION_CLEANUP_INTERVAL_SECS,
            )?,
        })
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
impl Config {
    /// Configuration for unit tests: cheap hashing, no Redis.
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: 0,
                rust_log: "debug".to_string(),
                json_logs: false,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/stackrush_test".to_string(),
                max_connections: 1,
            },
            redis: RedisConfig { url: None },
            jwt: JwtConfig {
                access_secret: "test_access_secret".to_string(),
                refresh_secret: "test_refresh_secret".to_string(),
                access_expiry_minutes: DEFAULT_ACCESS_TOKEN_EXPIRY_MINUTES,
                refresh_expiry_days: DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS,
            },
            security: SecurityConfig {
                password_hash_cost: 1,
            },
            rate_limit: RateLimitConfig {
                window_secs: rate_limits::GENERAL_WINDOW_SECS,
                max_requests: rate_limits::GENERAL_MAX_REQUESTS,
                auth_window_secs: rate_limits::AUTH_WINDOW_SECS,
                auth_max_requests: rate_limits::AUTH_MAX_REQUESTS,
            },
            notifications: NotificationConfig {
                cleanup_interval_secs: DEFAULT_NOTIFICATION_CLEANUP_INTERVAL_SECS,
            },
        }
    }
}
