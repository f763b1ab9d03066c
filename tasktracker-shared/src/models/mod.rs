/// Database models
///
/// # Models
///
/// - `user`: Accounts and their password hashes
/// - `refresh_token`: Persisted refresh-token rows (rotation lineage)
///
/// # Example
///
/// ```no_run
/// use tasktracker_shared::models::user::{NewUser, User};
/// use tasktracker_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, NewUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod refresh_token;
pub mod user;
