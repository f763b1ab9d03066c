/// Session state machine tests
///
/// Run against the in-memory store with a manually driven clock, so no
/// database is needed.
///
/// Run with: cargo test -p tasktracker-shared --test session_tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tasktracker_shared::{
    auth::{
        jwt::{AccessTokenCodec, JwtError},
        password::{HashingParams, PasswordHasher},
    },
    config::SessionConfig,
    models::refresh_token::RefreshToken,
    session::{
        store::StoreResult, IssuedRefreshToken,
        AuthFailure, Clock, ManualClock, MemoryStore, RefreshTokenStore, SessionCore, SessionError,
        UserStore,
    },
};
use uuid::Uuid;

const SECRET: &str = "session-tests-secret-0123456789abcdef";
const EMAIL: &str = "alice@example.com";
const PASSWORD: &str = "correct horse battery";

struct Harness {
    core: Arc<SessionCore>,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    ));
    let hasher = PasswordHasher::new(HashingParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    let config = SessionConfig::new(SECRET).unwrap();

    let core = SessionCore::with_clock(store.clone(), store.clone(), hasher, &config, clock.clone());

    Harness {
        core: Arc::new(core),
        store,
        clock,
    }
}

async fn registered() -> Harness {
    let h = harness();
    h.core.register(EMAIL, PASSWORD).await.unwrap();
    h
}

/// Token store that counts lookups before delegating to a `MemoryStore`
struct CountingStore {
    inner: Arc<MemoryStore>,
    lookups: AtomicUsize,
}

#[async_trait]
impl RefreshTokenStore for CountingStore {
    async fn create(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<IssuedRefreshToken> {
        self.inner.create(user_id, expires_at).await
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_token(token).await
    }

    async fn rotate(
        &self,
        current: &RefreshToken,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Option<IssuedRefreshToken>> {
        self.inner.rotate(current, expires_at).await
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        self.inner.revoke_all_for_user(user_id).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        RefreshTokenStore::delete(self.inner.as_ref(), id).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        self.inner.delete_expired(now).await
    }
}

fn auth_failure(err: SessionError) -> AuthFailure {
    match err {
        SessionError::AuthFailed(reason) => reason,
        other => panic!("expected AuthFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_normalises_email() {
    let h = harness();

    let user = h.core.register("  Alice@Example.COM ", PASSWORD).await.unwrap();
    assert_eq!(user.email, EMAIL);
    assert_ne!(user.password_hash, PASSWORD);

    let err = h.core.register(EMAIL, PASSWORD).await.unwrap_err();
    assert!(matches!(err, SessionError::Conflict(msg) if msg == "Email already in use"));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let h = harness();

    let err = h.core.register(EMAIL, "short").await.unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));
}

#[tokio::test]
async fn test_login_issues_distinct_refresh_tokens() {
    let h = registered().await;

    let first = h.core.login(EMAIL, PASSWORD).await.unwrap();
    let second = h.core.login(EMAIL, PASSWORD).await.unwrap();

    assert_ne!(first.refresh_token, second.refresh_token);
    assert_eq!(first.user_id, second.user_id);
    assert_eq!(first.email, EMAIL);
    assert_eq!(h.store.tokens_for_user(first.user_id).await.len(), 2);
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let h = registered().await;

    let session = h.core.login("ALICE@example.com", PASSWORD).await.unwrap();
    assert_eq!(session.email, EMAIL);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let h = registered().await;

    let wrong_password = h.core.login(EMAIL, "wrong password").await.unwrap_err();
    let unknown_email = h.core.login("nobody@example.com", PASSWORD).await.unwrap_err();

    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert_eq!(auth_failure(wrong_password), AuthFailure::InvalidCredentials);
    assert_eq!(auth_failure(unknown_email), AuthFailure::InvalidCredentials);
}

#[tokio::test]
async fn test_access_token_carries_email_subject() {
    let h = registered().await;
    let session = h.core.login(EMAIL, PASSWORD).await.unwrap();

    let claims = AccessTokenCodec::new(SECRET)
        .verify(&session.access_token)
        .unwrap();
    assert_eq!(claims.sub, EMAIL);

    let user = h.core.authenticate(&session.access_token).await.unwrap();
    assert_eq!(user.id, session.user_id);
}

#[tokio::test]
async fn test_authenticate_rejects_foreign_signature() {
    let h = registered().await;

    let forged = AccessTokenCodec::new("another-secret-that-is-long-enough-too")
        .issue(EMAIL, Duration::minutes(5))
        .unwrap();

    let err = h.core.authenticate(&forged).await.unwrap_err();
    assert!(matches!(err, SessionError::AccessToken(JwtError::Invalid(_))));
}

#[tokio::test]
async fn test_authenticate_unknown_subject_is_token_error() {
    let h = registered().await;
    let session = h.core.login(EMAIL, PASSWORD).await.unwrap();

    assert!(UserStore::delete(h.store.as_ref(), session.user_id).await.unwrap());

    let err = h.core.authenticate(&session.access_token).await.unwrap_err();
    assert!(matches!(err, SessionError::AccessToken(JwtError::Invalid(_))));
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let h = registered().await;
    let session = h.core.login(EMAIL, PASSWORD).await.unwrap();

    let rotated = h.core.refresh(&session.refresh_token).await.unwrap();

    assert_ne!(rotated.refresh_token, session.refresh_token);
    assert_eq!(rotated.user_id, session.user_id);

    let old = h
        .store
        .find_by_token(&session.refresh_token)
        .await
        .unwrap()
        .unwrap();
    assert!(old.revoked);

    let new = h
        .store
        .find_by_token(&rotated.refresh_token)
        .await
        .unwrap()
        .unwrap();
    assert!(!new.revoked);
    assert_eq!(new.expires_at, h.clock.now() + Duration::days(7));
}

#[tokio::test]
async fn test_replay_invalidates_whole_family() {
    let h = registered().await;
    let r1 = h.core.login(EMAIL, PASSWORD).await.unwrap().refresh_token;

    let r2 = h.core.refresh(&r1).await.unwrap().refresh_token;

    let replay = h.core.refresh(&r1).await.unwrap_err();
    assert_eq!(auth_failure(replay), AuthFailure::SessionInvalidated);

    let after = h.core.refresh(&r2).await.unwrap_err();
    assert_eq!(auth_failure(after), AuthFailure::SessionInvalidated);
}

#[tokio::test]
async fn test_replay_revokes_other_devices() {
    let h = registered().await;
    let laptop = h.core.login(EMAIL, PASSWORD).await.unwrap().refresh_token;
    let phone = h.core.login(EMAIL, PASSWORD).await.unwrap().refresh_token;

    h.core.refresh(&laptop).await.unwrap();
    h.core.refresh(&laptop).await.unwrap_err();

    let err = h.core.refresh(&phone).await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::SessionInvalidated);

    // A fresh login starts a new family
    let fresh = h.core.login(EMAIL, PASSWORD).await.unwrap();
    assert!(h.core.refresh(&fresh.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_unknown_and_missing_tokens() {
    let h = registered().await;

    let err = h.core.refresh(&"ab".repeat(32)).await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::TokenNotFound);

    let err = h.core.refresh("").await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::MissingToken);
}

#[tokio::test]
async fn test_malformed_tokens_skip_the_store() {
    let memory = Arc::new(MemoryStore::new());
    let tokens = Arc::new(CountingStore {
        inner: memory.clone(),
        lookups: AtomicUsize::new(0),
    });
    let config = SessionConfig::new(SECRET).unwrap();
    let hasher = PasswordHasher::new(HashingParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    let core = SessionCore::new(memory.clone(), tokens.clone(), hasher, &config);

    core.register(EMAIL, PASSWORD).await.unwrap();
    let session = core.login(EMAIL, PASSWORD).await.unwrap();

    let too_short = &session.refresh_token[..63];
    let not_hex = format!("{}zz", &session.refresh_token[..62]);
    for garbage in [too_short, not_hex.as_str(), "'; DROP TABLE refresh_tokens; --"] {
        let err = core.refresh(garbage).await.unwrap_err();
        assert_eq!(auth_failure(err), AuthFailure::TokenNotFound);
        core.logout(garbage).await.unwrap();
    }

    assert_eq!(tokens.lookups.load(Ordering::SeqCst), 0);
    let stored = memory.tokens_for_user(session.user_id).await;
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].revoked);

    // The well-formed token still works
    core.refresh(&session.refresh_token).await.unwrap();
    assert_eq!(tokens.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_token_expiry_boundary_is_exclusive() {
    let h = registered().await;
    let session = h.core.login(EMAIL, PASSWORD).await.unwrap();

    h.clock.advance(Duration::days(7));

    let err = h.core.refresh(&session.refresh_token).await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::TokenExpired);

    // The expired row is deleted, so a second attempt finds nothing
    let err = h.core.refresh(&session.refresh_token).await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::TokenNotFound);
}

#[tokio::test]
async fn test_token_valid_just_before_expiry() {
    let h = registered().await;
    let session = h.core.login(EMAIL, PASSWORD).await.unwrap();

    h.clock.advance(Duration::days(7) - Duration::milliseconds(1));

    assert!(h.core.refresh(&session.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_revoked_and_expired_takes_theft_branch() {
    let h = registered().await;
    let r1 = h.core.login(EMAIL, PASSWORD).await.unwrap().refresh_token;
    h.core.refresh(&r1).await.unwrap();

    h.clock.advance(Duration::days(30));

    let err = h.core.refresh(&r1).await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::SessionInvalidated);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = registered().await;
    let session = h.core.login(EMAIL, PASSWORD).await.unwrap();

    h.core.logout(&session.refresh_token).await.unwrap();
    h.core.logout(&session.refresh_token).await.unwrap();
    h.core.logout(&"cd".repeat(32)).await.unwrap();
    h.core.logout("").await.unwrap();

    let tokens = h.store.tokens_for_user(session.user_id).await;
    assert!(tokens.iter().all(|t| t.revoked));

    // Refreshing a logged-out token is a replay
    let err = h.core.refresh(&session.refresh_token).await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::SessionInvalidated);
}

#[tokio::test]
async fn test_concurrent_refresh_has_one_winner() {
    let h = registered().await;
    let token = h.core.login(EMAIL, PASSWORD).await.unwrap().refresh_token;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let core = h.core.clone();
            let token = token.clone();
            tokio::spawn(async move { core.refresh(&token).await })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(tokens) => winners.push(tokens),
            Err(err) => assert_eq!(auth_failure(err), AuthFailure::SessionInvalidated),
        }
    }

    assert_eq!(winners.len(), 1);

    // Losers took the theft branch, so the winner's child is revoked too
    let child = h
        .store
        .find_by_token(&winners[0].refresh_token)
        .await
        .unwrap()
        .unwrap();
    assert!(child.revoked);
}

#[tokio::test]
async fn test_purge_removes_only_expired_rows() {
    let h = registered().await;
    let old = h.core.login(EMAIL, PASSWORD).await.unwrap();

    h.clock.advance(Duration::days(3));
    let recent = h.core.login(EMAIL, PASSWORD).await.unwrap();
    h.core.refresh(&recent.refresh_token).await.unwrap();

    h.clock.advance(Duration::days(5));

    assert_eq!(h.core.purge_expired().await.unwrap(), 1);
    assert_eq!(h.store.token_count().await, 2);

    let err = h.core.refresh(&old.refresh_token).await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::TokenNotFound);
}

#[tokio::test]
async fn test_user_delete_cascades() {
    let h = registered().await;
    let session = h.core.login(EMAIL, PASSWORD).await.unwrap();

    assert!(UserStore::delete(h.store.as_ref(), session.user_id).await.unwrap());
    assert_eq!(h.store.token_count().await, 0);

    let err = h.core.refresh(&session.refresh_token).await.unwrap_err();
    assert_eq!(auth_failure(err), AuthFailure::TokenNotFound);
}
