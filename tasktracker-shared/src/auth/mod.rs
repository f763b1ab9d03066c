/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Short-lived access token signing and verification
/// - [`refresh_token`]: Opaque refresh token generation and digesting
///
/// # Example
///
/// ```no_run
/// use tasktracker_shared::auth::password::{HashingParams, PasswordHasher};
/// use tasktracker_shared::auth::jwt::AccessTokenCodec;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(HashingParams::default())?;
/// let hash = hasher.hash("user_password")?;
/// assert!(hasher.verify("user_password", &hash)?);
///
/// let codec = AccessTokenCodec::new("a-secret-of-at-least-thirty-two-bytes!");
/// let token = codec.issue("user@example.com", Duration::minutes(15))?;
/// assert_eq!(codec.verify(&token)?.sub, "user@example.com");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
pub mod refresh_token;
