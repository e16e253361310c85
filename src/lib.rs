//! StackRush - Coding Challenge Practice Platform
//!
//! Backend for a practice platform where users solve coding challenges in the
//! browser, report their execution results, and earn score, XP, levels,
//! streaks and achievements.
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Business logic (scoring pipeline, achievements, notifications)
//! - **Repositories**: Database access behind traits
//! - **Models**: Domain models
//! - **Jobs**: Background housekeeping

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
