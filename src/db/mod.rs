//! Database module
//!
//! Connection pool, embedded migrations and repositories.

pub mod connection;
pub mod repositories;

use sqlx::PgPool;

pub use connection::{create_pool, ping};
pub use repositories::Repositories;

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
