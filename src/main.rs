//! StackRush - Application Entry Point

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use redis::Client as RedisClient;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stackrush::{
    config::Config,
    db::{self, Repositories},
    handlers,
    jobs::NotificationCleanupJob,
    services::Services,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(&config);
    tracing::info!("Starting StackRush server...");

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    let redis = match &config.redis.url {
        Some(url) => {
            tracing::info!("Connecting to Redis...");
            let client = RedisClient::open(url.as_str())?;
            Some(redis::aio::ConnectionManager::new(client).await?)
        }
        None => {
            tracing::warn!("REDIS_URL not set, rate limiting disabled");
            None
        }
    };

    let services = Services::new(Repositories::postgres(db_pool.clone()), &config);

    let cleanup = NotificationCleanupJob::new(
        services.notifications.clone(),
        Duration::from_secs(config.notifications.cleanup_interval_secs),
    )
    .start();

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let state = AppState::new(db_pool, redis, services, config);
    let app = handlers::router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.stop().await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config.server.rust_log.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.server.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
