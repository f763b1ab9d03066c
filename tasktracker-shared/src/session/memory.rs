/// In-memory store backend
///
/// Implements both [`UserStore`] and [`RefreshTokenStore`] over a single
/// mutex-guarded state so that user deletion can cascade to tokens and the
/// rotation compare-and-set happens under one lock. Used by the test suites
/// and for running the API without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    error::StoreError,
    store::{IssuedRefreshToken, RefreshTokenStore, StoreResult, UserStore},
};
use crate::{
    auth::refresh_token::{generate_refresh_token, hash_refresh_token},
    models::{
        refresh_token::RefreshToken,
        user::{NewUser, User},
    },
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    tokens: HashMap<Uuid, RefreshToken>,
}

impl State {
    fn insert_token(&mut self, user_id: Uuid, expires_at: DateTime<Utc>) -> IssuedRefreshToken {
        let (token, token_hash) = generate_refresh_token();

        let record = RefreshToken {
            id: Uuid::new_v4(),
            token_hash,
            user_id,
            expires_at,
            revoked: false,
            created_at: Utc::now(),
        };
        self.tokens.insert(record.id, record.clone());

        IssuedRefreshToken { record, token }
    }
}

/// Users and refresh tokens held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every token row owned by `user_id`
    pub async fn tokens_for_user(&self, user_id: Uuid) -> Vec<RefreshToken> {
        let state = self.state.lock().await;
        state
            .tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Total number of token rows
    pub async fn token_count(&self) -> usize {
        self.state.lock().await.tokens.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn save(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;

        let removed = state.users.remove(&id).is_some();
        if removed {
            state.tokens.retain(|_, t| t.user_id != id);
        }

        Ok(removed)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<IssuedRefreshToken> {
        Ok(self.state.lock().await.insert_token(user_id, expires_at))
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let digest = hash_refresh_token(token);
        let state = self.state.lock().await;

        Ok(state.tokens.values().find(|t| t.token_hash == digest).cloned())
    }

    async fn rotate(
        &self,
        current: &RefreshToken,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Option<IssuedRefreshToken>> {
        let mut state = self.state.lock().await;

        match state.tokens.get_mut(&current.id) {
            Some(row) if !row.revoked => row.revoked = true,
            _ => return Ok(None),
        }

        Ok(Some(state.insert_token(current.user_id, expires_at)))
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.lock().await;

        let mut flipped = 0;
        for token in state.tokens.values_mut() {
            if token.user_id == user_id && !token.revoked {
                token.revoked = true;
                flipped += 1;
            }
        }

        Ok(flipped)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.lock().await.tokens.remove(&id).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;

        let before = state.tokens.len();
        state.tokens.retain(|_, t| t.expires_at >= now);

        Ok((before - state.tokens.len()) as u64)
    }
}
