//! # Task Tracker Worker
//!
//! Deletes expired refresh tokens once a day.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tasktracker-worker
//! ```

use std::sync::Arc;
use tasktracker_shared::{
    db::pool::{close_pool, create_pool, DatabaseConfig},
    session::PgRefreshTokenStore,
};
use tasktracker_worker::{config::WorkerConfig, purge::PurgeScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasktracker_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Task Tracker Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database_url.clone(),
        max_connections: config.max_connections,
        ..Default::default()
    })
    .await?;

    let tokens = Arc::new(PgRefreshTokenStore::new(pool.clone()));
    let scheduler = PurgeScheduler::new(tokens, config.schedule);
    let shutdown = scheduler.shutdown_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received, stopping...");
        shutdown.cancel();
    });

    scheduler.run().await;

    close_pool(pool).await;
    Ok(())
}
