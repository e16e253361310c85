//! Recurring background jobs
//!
//! Jobs are started explicitly from `main` and stopped during shutdown.

pub mod notification_cleanup;

pub use notification_cleanup::NotificationCleanupJob;
