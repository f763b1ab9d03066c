/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasktracker_api::{app::{build_router, AppState}, config::Config};
/// use tasktracker_shared::{
///     auth::password::{HashingParams, PasswordHasher},
///     session::{MemoryStore, SessionCore},
/// };
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = Arc::new(MemoryStore::new());
/// let hasher = PasswordHasher::new(HashingParams::default())?;
/// let session = SessionCore::new(store.clone(), store, hasher, &config.session);
///
/// let app = build_router(AppState::new(Arc::new(session), config));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, cookie::CookiePolicy, middleware::require_auth};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tasktracker_shared::session::SessionCore;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Session state machine
    pub session: Arc<SessionCore>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Refresh cookie attributes
    pub cookies: CookiePolicy,
}

impl AppState {
    /// Creates new application state
    pub fn new(session: Arc<SessionCore>, config: Config) -> Self {
        let cookies = CookiePolicy::new(config.cookie.secure, session.refresh_token_ttl());

        Self {
            session,
            config: Arc::new(config),
            cookies,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// └── /api/v1/auth/
///     ├── POST /register
///     ├── POST /login           # sets refresh cookie
///     ├── POST /refresh         # rotates refresh cookie
///     ├── POST /logout          # clears refresh cookie
///     └── GET  /me              # bearer token required
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Routes that require a valid access token
    let protected_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout))
        .merge(protected_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1/auth", auth_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Configures CORS from the allowed origin list
///
/// Credentials are allowed so the browser sends the refresh cookie.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
