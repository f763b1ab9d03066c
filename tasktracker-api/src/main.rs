//! # Task Tracker API Server
//!
//! Credential and session layer of the Task Tracker backend: registration,
//! login, refresh-token rotation with replay detection, and logout.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... JWT_SECRET=$(openssl rand -hex 32) cargo run -p tasktracker-api
//! ```

use std::sync::Arc;
use tasktracker_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasktracker_shared::{
    auth::password::{HashingParams, PasswordHasher},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    session::{PgRefreshTokenStore, PgUserStore, SessionCore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasktracker_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Task Tracker API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    tracing::info!(
        access_token_ttl_secs = config.session.access_token_ttl.num_seconds(),
        refresh_token_ttl_secs = config.session.refresh_token_ttl.num_seconds(),
        cookie_secure = config.cookie.secure,
        "Configuration loaded"
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let session = SessionCore::new(
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgRefreshTokenStore::new(pool.clone())),
        PasswordHasher::new(HashingParams::default())?,
        &config.session,
    );

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(Arc::new(session), config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
