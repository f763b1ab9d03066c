/// Refresh token model and database operations
///
/// Each row is one link in a session's rotation lineage. Rows are created on
/// login and on every successful rotation, flipped to `revoked = TRUE` when
/// rotated away or when the owner's sessions are terminated, and otherwise
/// never updated. Expired rows are garbage-collected by [`RefreshToken::delete_expired`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     revoked BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Persisted refresh token row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RefreshToken {
    /// Row ID
    pub id: Uuid,

    /// SHA-256 hex digest of the opaque token (never the plaintext)
    #[serde(skip_serializing)]
    pub token_hash: String,

    /// Owning user
    pub user_id: Uuid,

    /// Absolute expiry
    pub expires_at: DateTime<Utc>,

    /// Set once the token has been rotated away or its session terminated
    pub revoked: bool,

    /// When the row was inserted
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a refresh token at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Not revoked and `expires_at > now`
    Active,

    /// Revoked (rotated or terminated). Takes precedence over expiry.
    Revoked,

    /// Not revoked but `expires_at <= now`
    Expired,
}

impl RefreshToken {
    /// Classifies the token at `now`
    ///
    /// Revocation is checked before expiry: presenting a revoked token is a
    /// replay regardless of its age. The expiry boundary is exclusive, a
    /// token is only valid while `expires_at > now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked {
            TokenState::Revoked
        } else if self.expires_at <= now {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

    /// Inserts a new, unrevoked token row
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, token_hash, user_id, expires_at, revoked, created_at
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Finds a token row by the digest of the presented token
    pub async fn find_by_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, token_hash, user_id, expires_at, revoked, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Revokes `current_id` and inserts its successor in one transaction
    ///
    /// The revoke is a compare-and-set on `revoked = FALSE`. If another
    /// caller already flipped the row, nothing is inserted and `None` is
    /// returned, so at most one rotation per token can ever succeed.
    pub async fn rotate(
        pool: &PgPool,
        current_id: Uuid,
        user_id: Uuid,
        new_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(current_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(None);
        }

        let successor = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, token_hash, user_id, expires_at, revoked, created_at
            "#,
        )
        .bind(new_token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(successor))
    }

    /// Revokes every unrevoked token owned by `user_id`
    ///
    /// Single conditional bulk update, idempotent. Returns the number of
    /// rows flipped.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a single token row
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every row with `expires_at < now`, revoked or not
    pub async fn delete_expired(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
