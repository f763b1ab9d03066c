/// Access token signing and verification
///
/// Access tokens are compact HS256 JWTs binding a subject (the user's email)
/// to an absolute expiry. They carry no server-side state: validity is
/// decided purely by signature and expiry at verification time, so a leaked
/// token stays usable until it expires. Keep the TTL short (minutes).
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Validation**: signature, issuer, `exp` with zero leeway
/// - **Secret**: injected once at startup, at least 32 bytes, never rotated
///   at runtime
///
/// # Example
///
/// ```
/// use tasktracker_shared::auth::jwt::AccessTokenCodec;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = AccessTokenCodec::new("your-secret-key-at-least-32-bytes");
///
/// let token = codec.issue("user@example.com", Duration::minutes(15))?;
/// let claims = codec.verify(&token)?;
/// assert_eq!(claims.sub, "user@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Value of the `iss` claim on every token this codec issues
pub const ISSUER: &str = "task-tracker";

/// Error type for access token operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    /// Bad signature, wrong issuer or malformed token
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Signature is valid but `exp` has passed
    #[error("Token has expired")]
    Expired,

    /// Token could not be encoded
    #[error("Failed to create token: {0}")]
    Signing(String),
}

/// JWT claims carried by an access token
///
/// - `sub`: Subject (user email)
/// - `iss`: Issuer (always [`ISSUER`])
/// - `iat`: Issued at (Unix seconds)
/// - `exp`: Expiration (Unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user email
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `subject` expiring `ttl` from now
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Gets time until expiration, `None` once expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Signs and verifies access tokens with a process-wide secret
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("issuer", &ISSUER)
            .finish_non_exhaustive()
    }
}

impl AccessTokenCodec {
    /// Creates a codec from the signing secret
    ///
    /// The secret is captured here and never changes for the lifetime of
    /// the codec. Length requirements are enforced when configuration is
    /// loaded, see [`crate::config::SessionConfig::from_env`].
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issues a signed token for `subject` valid for `ttl`
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Signing` if encoding fails
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, JwtError> {
        let claims = Claims::new(subject, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(format!("Token encoding failed: {}", e)))
    }

    /// Verifies signature, issuer and expiry and returns the claims
    ///
    /// # Errors
    ///
    /// - `JwtError::Expired` if the signature is valid but `exp` has passed
    /// - `JwtError::Invalid` for everything else
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }
}
