/// Session configuration
///
/// Loaded once at startup and injected into [`SessionCore`](crate::session::SessionCore).
/// Both the API server and the worker read the same variables so they agree
/// on token lifetimes.
///
/// # Environment Variables
///
/// - `JWT_SECRET`: Access-token signing secret (required, at least 32 chars)
/// - `JWT_EXPIRATION`: Access-token TTL in milliseconds (default: 900000, 15 minutes)
/// - `REFRESH_TOKEN_EXPIRATION`: Refresh-token TTL in milliseconds (default: 604800000, 7 days)

use chrono::Duration;
use std::env;

/// Minimum accepted length of the signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default access-token TTL in milliseconds (15 minutes)
pub const DEFAULT_ACCESS_TOKEN_TTL_MS: i64 = 15 * 60 * 1000;

/// Default refresh-token TTL in milliseconds (7 days)
pub const DEFAULT_REFRESH_TOKEN_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Error loading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required variable not set
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// Variable set but unusable
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Token lifetimes and signing secret
#[derive(Clone)]
pub struct SessionConfig {
    /// HS256 signing secret for access tokens
    pub signing_secret: String,

    /// Access-token lifetime
    pub access_token_ttl: Duration,

    /// Refresh-token lifetime, also the refresh cookie max-age
    pub refresh_token_ttl: Duration,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("signing_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

impl SessionConfig {
    /// Builds a config with default TTLs
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the secret is shorter than
    /// [`MIN_SECRET_LENGTH`].
    pub fn new(signing_secret: impl Into<String>) -> Result<Self, ConfigError> {
        let signing_secret = signing_secret.into();
        validate_secret(&signing_secret)?;

        Ok(Self {
            signing_secret,
            access_token_ttl: Duration::milliseconds(DEFAULT_ACCESS_TOKEN_TTL_MS),
            refresh_token_ttl: Duration::milliseconds(DEFAULT_REFRESH_TOKEN_TTL_MS),
        })
    }

    /// Loads the session configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        let mut config = Self::new(secret)?;

        if let Some(ms) = millis_var("JWT_EXPIRATION")? {
            config.access_token_ttl = Duration::milliseconds(ms);
        }
        if let Some(ms) = millis_var("REFRESH_TOKEN_EXPIRATION")? {
            config.refresh_token_ttl = Duration::milliseconds(ms);
        }

        Ok(config)
    }
}

fn validate_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::Invalid {
            name: "JWT_SECRET",
            reason: format!("must be at least {} characters long", MIN_SECRET_LENGTH),
        });
    }
    Ok(())
}

/// Reads a positive millisecond duration, `None` if unset
fn millis_var(name: &'static str) -> Result<Option<i64>, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_millis(name, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

/// Shortest accepted lifetime. Token expiry is carried in whole seconds.
const MIN_TTL_MILLIS: i64 = 1000;

fn parse_millis(name: &'static str, raw: &str) -> Result<i64, ConfigError> {
    let ms = raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;

    if ms < MIN_TTL_MILLIS {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("must be at least {} milliseconds", MIN_TTL_MILLIS),
        });
    }

    Ok(ms)
}
