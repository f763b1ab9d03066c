/// Persistence seams used by the session core
///
/// Two backends implement these traits: [`PgUserStore`](super::postgres::PgUserStore)
/// / [`PgRefreshTokenStore`](super::postgres::PgRefreshTokenStore) for production
/// and [`MemoryStore`](super::memory::MemoryStore) for tests and local runs.
///
/// Refresh-token stores own token generation: callers receive the plaintext
/// exactly once, inside [`IssuedRefreshToken`], and afterwards can only refer
/// to a token by presenting the plaintext again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::StoreError;
use crate::models::{
    refresh_token::RefreshToken,
    user::{NewUser, User},
};

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A freshly created refresh token together with its plaintext
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// Persisted row
    pub record: RefreshToken,

    /// Opaque token to hand to the client. Not recoverable later.
    pub token: String,
}

/// User record lookups
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Looks up by normalised email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Persists a new user
    ///
    /// Fails with `StoreError::Duplicate("email")` if the email is taken.
    async fn save(&self, user: NewUser) -> StoreResult<User>;

    /// Deletes a user and everything it owns. Returns false if absent.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Persisted refresh-token records
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Generates a new random token and persists it unrevoked
    async fn create(&self, user_id: Uuid, expires_at: DateTime<Utc>)
        -> StoreResult<IssuedRefreshToken>;

    /// Resolves a presented plaintext token to its row
    async fn find_by_token(&self, token: &str) -> StoreResult<Option<RefreshToken>>;

    /// Revokes `current` and creates its successor for the same user
    ///
    /// The revoke is a compare-and-set on `revoked = false`. Exactly one
    /// concurrent caller per row can win; losers get `Ok(None)` and nothing
    /// is created.
    async fn rotate(
        &self,
        current: &RefreshToken,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Option<IssuedRefreshToken>>;

    /// Flips every unrevoked token of `user_id` to revoked. Idempotent.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<u64>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Removes rows with `expires_at < now`, revoked or not
    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Confirms the backend is reachable
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
