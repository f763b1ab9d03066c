/// Session management
///
/// - `core`: [`SessionCore`], the login / refresh / logout state machine
/// - `store`: Persistence traits the core depends on
/// - `postgres`: PostgreSQL implementations of the store traits
/// - `memory`: In-memory implementation for tests and local runs
/// - `clock`: Injectable time source
/// - `error`: Error taxonomy
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasktracker_shared::{
///     auth::password::{HashingParams, PasswordHasher},
///     config::SessionConfig,
///     session::{MemoryStore, SessionCore},
/// };
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::new());
/// let hasher = PasswordHasher::new(HashingParams { memory_kib: 1024, iterations: 1, parallelism: 1 })?;
/// let config = SessionConfig::new("0123456789abcdef0123456789abcdef")?;
///
/// let core = SessionCore::new(store.clone(), store, hasher, &config);
///
/// core.register("alice@example.com", "correct horse").await?;
/// let session = core.login("alice@example.com", "correct horse").await?;
/// let rotated = core.refresh(&session.refresh_token).await?;
/// assert_ne!(rotated.refresh_token, session.refresh_token);
/// # Ok(())
/// # }
/// ```

pub mod clock;
pub mod core;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use self::core::{normalize_email, SessionCore, SessionTokens};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthFailure, SessionError, SessionResult, StoreError};
pub use memory::MemoryStore;
pub use postgres::{PgRefreshTokenStore, PgUserStore};
pub use store::{IssuedRefreshToken, RefreshTokenStore, UserStore};
