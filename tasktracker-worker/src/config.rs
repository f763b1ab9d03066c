/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 2)
/// - `PURGE_HOUR_UTC`: Hour of day the purge runs (default: 3)

use crate::schedule::DailySchedule;
use std::env;

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// When the purge runs
    pub schedule: DailySchedule,
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "2".to_string())
            .parse::<u32>()?;

        let purge_hour = env::var("PURGE_HOUR_UTC")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()?;

        Ok(Self {
            database_url,
            max_connections,
            schedule: DailySchedule::new(purge_hour, 0)?,
        })
    }
}
