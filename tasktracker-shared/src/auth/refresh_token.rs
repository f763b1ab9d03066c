/// Opaque refresh token generation
///
/// Refresh tokens are random bearer strings with no internal structure. The
/// plaintext is handed to the client exactly once; only its SHA-256 digest is
/// persisted, so a read of the `refresh_tokens` table does not yield usable
/// credentials.
///
/// # Format
///
/// 32 bytes from the OS CSPRNG, hex encoded (64 lowercase hex chars).
///
/// # Example
///
/// ```
/// use tasktracker_shared::auth::refresh_token::{generate_refresh_token, hash_refresh_token};
///
/// let (token, digest) = generate_refresh_token();
/// assert_eq!(token.len(), 64);
/// assert_eq!(hash_refresh_token(&token), digest);
/// ```

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes in a refresh token
const TOKEN_BYTES: usize = 32;

/// Length of an encoded refresh token
pub const REFRESH_TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generates a new refresh token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hex_digest)
pub fn generate_refresh_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let digest = hash_refresh_token(&token);

    (token, digest)
}

/// Hashes a presented refresh token for lookup
///
/// Deterministic, so the digest of a presented token can be matched against
/// the stored `token_hash` column.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cheap shape check applied before touching the store
///
/// Anything that could not have been produced by [`generate_refresh_token`]
/// is rejected without a lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == REFRESH_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_hexdigit())
}
