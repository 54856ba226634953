use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Inputs above this size are refused before reaching Argon2.
pub const MAX_PASSWORD_BYTES: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password exceeds {} bytes", MAX_PASSWORD_BYTES)]
    TooLong,

    #[error("argon2 hash error: {0}")]
    Hash(password_hash::Error),

    #[error("stored hash is malformed: {0}")]
    MalformedHash(password_hash::Error),
}

/// Argon2id with default cost parameters; the PHC output embeds params and salt.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    if plain.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hash(e)
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; errors only when the stored hash cannot be parsed.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        PasswordError::MalformedHash(e)
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e)),
    }
}
