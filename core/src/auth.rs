use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::Rng;
use sha2::{Digest, Sha256};

pub const ACCESS_TOKEN_PREFIX: &str = "gw_at_";

/// Generate an access token. Returns `(full_token, sha256_hash)`.
/// Format: `gw_at_` + 32 random bytes hex-encoded.
pub fn generate_access_token() -> (String, String) {
    let raw = random_hex(32);
    let full_token = format!("{ACCESS_TOKEN_PREFIX}{raw}");
    let hash = hash_token(&full_token);
    (full_token, hash)
}

/// SHA-256 hex digest of a token string. Only digests are stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Failed to hash password: {e}"))
}

/// Verify a password against an Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(hash).map_err(|e| format!("Invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Lowercased, trimmed email used for uniqueness and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generate `n` random bytes and return as hex string.
fn random_hex(n: usize) -> String {
    let bytes: Vec<u8> = (0..n).map(|_| rand::thread_rng().r#gen::<u8>()).collect();
    hex::encode(&bytes)
}
