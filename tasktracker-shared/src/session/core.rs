/// The session state machine
///
/// `SessionCore` is the only component that decides whether a credential is
/// accepted. It holds no mutable session state of its own: every decision is
/// made from rows in the [`RefreshTokenStore`], so any number of request
/// tasks can share one instance behind an `Arc`.
///
/// # Refresh-token lineage
///
/// ```text
/// login ──► Active ──refresh──► Rotated (revoked, has a child)
///             │
///             ├── expiry passes ──► Expired (row deleted when presented)
///             └── logout / replay ──► Revoked
/// ```
///
/// Presenting a revoked token is treated as theft: every refresh token the
/// owner holds is revoked and the caller must log in again.

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    clock::{Clock, SystemClock},
    error::{AuthFailure, SessionError, SessionResult, StoreError},
    store::{RefreshTokenStore, UserStore},
};
use crate::{
    auth::{
        jwt::{AccessTokenCodec, JwtError},
        password::PasswordHasher,
        refresh_token,
    },
    config::SessionConfig,
    models::{
        refresh_token::TokenState,
        user::{NewUser, User},
    },
};

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length at registration
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Tokens handed out by a successful login or refresh
#[derive(Debug, Clone)]
pub struct SessionTokens {
    /// Signed short-lived bearer token
    pub access_token: String,

    /// Opaque single-use refresh token
    pub refresh_token: String,

    pub user_id: Uuid,

    pub email: String,
}

/// Login, refresh rotation, logout and theft detection
pub struct SessionCore {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    codec: AccessTokenCodec,
    clock: Arc<dyn Clock>,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl std::fmt::Debug for SessionCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCore")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish_non_exhaustive()
    }
}

/// Trims and lowercases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl SessionCore {
    /// Creates a core using the wall clock
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
        hasher: PasswordHasher,
        config: &SessionConfig,
    ) -> Self {
        Self::with_clock(users, tokens, hasher, config, Arc::new(SystemClock))
    }

    /// Creates a core with an explicit time source
    pub fn with_clock(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
        hasher: PasswordHasher,
        config: &SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            codec: AccessTokenCodec::new(&config.signing_secret),
            clock,
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
        }
    }

    /// Refresh-token lifetime, also used as the cookie max-age
    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }

    /// Creates a new account
    ///
    /// # Errors
    ///
    /// - `Validation` if the email is blank or the password length is out of range
    /// - `Conflict` if the email is already registered
    pub async fn register(&self, email: &str, password: &str) -> SessionResult<User> {
        let email = normalize_email(email);

        if email.is_empty() || !email.contains('@') {
            return Err(SessionError::Validation("email is not a valid address".into()));
        }
        let length = password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
            return Err(SessionError::Validation(format!(
                "password must be between {} and {} characters",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            )));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(SessionError::Conflict("Email already in use".into()));
        }

        let password_hash = self.hasher.hash(password)?;

        let user = self
            .users
            .save(NewUser {
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race against a concurrent registration
                StoreError::Duplicate(_) => SessionError::Conflict("Email already in use".into()),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verifies credentials and opens a new session
    ///
    /// Unknown email and wrong password fail with the same
    /// [`AuthFailure::InvalidCredentials`], and both run one full password
    /// verification.
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<SessionTokens> {
        let email = normalize_email(email);

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                self.hasher.verify_decoy(password);
                debug!("Login rejected");
                return Err(AuthFailure::InvalidCredentials.into());
            }
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            debug!(user_id = %user.id, "Login rejected");
            return Err(AuthFailure::InvalidCredentials.into());
        }

        let access_token = self.issue_access_token(&user.email)?;
        let issued = self
            .tokens
            .create(user.id, self.clock.now() + self.refresh_token_ttl)
            .await?;

        info!(user_id = %user.id, "User logged in");

        Ok(SessionTokens {
            access_token,
            refresh_token: issued.token,
            user_id: user.id,
            email: user.email,
        })
    }

    /// Exchanges a refresh token for a new access token and a rotated refresh token
    ///
    /// Decision order:
    /// 1. malformed or unknown token: `TokenNotFound`
    /// 2. revoked token: revoke every token of the owner, `SessionInvalidated`
    /// 3. expired token: delete the row, `TokenExpired`
    /// 4. otherwise rotate. Losing the rotation race is handled as step 2.
    pub async fn refresh(&self, presented: &str) -> SessionResult<SessionTokens> {
        if presented.is_empty() {
            return Err(AuthFailure::MissingToken.into());
        }
        if !refresh_token::is_well_formed(presented) {
            return Err(AuthFailure::TokenNotFound.into());
        }

        let current = self
            .tokens
            .find_by_token(presented)
            .await?
            .ok_or(SessionError::AuthFailed(AuthFailure::TokenNotFound))?;

        let now = self.clock.now();
        match current.state_at(now) {
            TokenState::Revoked => return Err(self.invalidate_sessions(current.user_id).await),
            TokenState::Expired => {
                self.tokens.delete(current.id).await?;
                debug!(user_id = %current.user_id, "Expired refresh token presented");
                return Err(AuthFailure::TokenExpired.into());
            }
            TokenState::Active => {}
        }

        let user = match self.users.find_by_id(current.user_id).await? {
            Some(user) => user,
            None => {
                self.tokens.delete(current.id).await?;
                return Err(AuthFailure::TokenNotFound.into());
            }
        };

        let issued = match self
            .tokens
            .rotate(&current, now + self.refresh_token_ttl)
            .await?
        {
            Some(issued) => issued,
            None => return Err(self.invalidate_sessions(user.id).await),
        };

        let access_token = self.issue_access_token(&user.email)?;

        debug!(user_id = %user.id, "Refresh token rotated");

        Ok(SessionTokens {
            access_token,
            refresh_token: issued.token,
            user_id: user.id,
            email: user.email,
        })
    }

    fn issue_access_token(&self, email: &str) -> SessionResult<String> {
        self.codec
            .issue(email, self.access_token_ttl)
            .map_err(|e| SessionError::Internal(e.to_string()))
    }

    /// Theft response: revoke every refresh token of `user_id`
    ///
    /// Returns the error to surface. If the revoke itself fails, the store
    /// error is surfaced instead so the replay is never silently accepted.
    async fn invalidate_sessions(&self, user_id: Uuid) -> SessionError {
        match self.tokens.revoke_all_for_user(user_id).await {
            Ok(revoked) => {
                warn!(
                    user_id = %user_id,
                    revoked,
                    "Refresh token replay detected, all sessions revoked"
                );
                AuthFailure::SessionInvalidated.into()
            }
            Err(e) => e.into(),
        }
    }

    /// Ends every session of the token's owner
    ///
    /// Unknown or already revoked tokens are not an error.
    pub async fn logout(&self, presented: &str) -> SessionResult<()> {
        if !refresh_token::is_well_formed(presented) {
            return Ok(());
        }

        if let Some(token) = self.tokens.find_by_token(presented).await? {
            let revoked = self.tokens.revoke_all_for_user(token.user_id).await?;
            info!(user_id = %token.user_id, revoked, "User logged out");
        }

        Ok(())
    }

    /// Resolves a bearer access token to its user
    ///
    /// # Errors
    ///
    /// - `AccessToken` if the token is malformed, badly signed or expired, or
    ///   if its subject no longer exists
    pub async fn authenticate(&self, access_token: &str) -> SessionResult<User> {
        let claims = self.codec.verify(access_token)?;

        self.users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| {
                SessionError::AccessToken(JwtError::Invalid("unknown subject".to_string()))
            })
    }

    /// Deletes refresh-token rows whose expiry has passed
    ///
    /// Returns the number of rows removed.
    pub async fn purge_expired(&self) -> SessionResult<u64> {
        let purged = self.tokens.delete_expired(self.clock.now()).await?;
        info!(purged, "Purged expired refresh tokens");
        Ok(purged)
    }

    /// Confirms the token store is reachable
    pub async fn store_health(&self) -> SessionResult<()> {
        Ok(self.tokens.health_check().await?)
    }
}
