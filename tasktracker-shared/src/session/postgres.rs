/// PostgreSQL store backends
///
/// Thin adapters over the model queries in [`crate::models`]. Unique
/// violations are translated into [`StoreError::Duplicate`] so callers never
/// need to inspect database error codes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    error::StoreError,
    store::{IssuedRefreshToken, RefreshTokenStore, StoreResult, UserStore},
};
use crate::{
    auth::refresh_token::{generate_refresh_token, hash_refresh_token},
    db::pool::health_check,
    models::{
        refresh_token::RefreshToken,
        user::{NewUser, User},
    },
};

/// Maps a unique violation to `Duplicate(field)`, anything else to `Database`
fn map_unique(err: sqlx::Error, field: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(field.to_string())
        }
        _ => StoreError::Database(err),
    }
}

/// Users table
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn save(&self, user: NewUser) -> StoreResult<User> {
        User::create(&self.pool, user)
            .await
            .map_err(|e| map_unique(e, "email"))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(User::delete(&self.pool, id).await?)
    }
}

/// Refresh tokens table
#[derive(Debug, Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn create(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<IssuedRefreshToken> {
        let (token, digest) = generate_refresh_token();

        let record = RefreshToken::create(&self.pool, user_id, &digest, expires_at)
            .await
            .map_err(|e| map_unique(e, "token_hash"))?;

        Ok(IssuedRefreshToken { record, token })
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let digest = hash_refresh_token(token);
        Ok(RefreshToken::find_by_hash(&self.pool, &digest).await?)
    }

    async fn rotate(
        &self,
        current: &RefreshToken,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Option<IssuedRefreshToken>> {
        let (token, digest) = generate_refresh_token();

        let successor =
            RefreshToken::rotate(&self.pool, current.id, current.user_id, &digest, expires_at)
                .await
                .map_err(|e| map_unique(e, "token_hash"))?;

        Ok(successor.map(|record| IssuedRefreshToken { record, token }))
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(RefreshToken::revoke_all_for_user(&self.pool, user_id).await?)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(RefreshToken::delete(&self.pool, id).await?)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(RefreshToken::delete_expired(&self.pool, now).await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
