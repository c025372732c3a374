//! Operator access-code verification
//!
//! Access codes are never stored in clear: the server is configured with an
//! Argon2id PHC hash and checks presented codes against it.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid access code hash: {0}")]
    InvalidHash(String),

    #[error("access code verification failed: {0}")]
    Verification(String),
}

/// Decides whether a presented access code belongs to an operator
#[async_trait]
pub trait AccessVerifier: Send + Sync {
    async fn verify(&self, code: &str) -> Result<bool, AuthError>;
}

/// Hash an access code with Argon2id and a random salt (PHC string format).
pub fn hash_access_code(code: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(code.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::InvalidHash(e.to_string()))
}

pub struct Argon2AccessVerifier {
    hash: String,
}

impl Argon2AccessVerifier {
    /// Fails on start-up rather than on first login if the hash is malformed.
    pub fn new(hash: impl Into<String>) -> Result<Self, AuthError> {
        let hash = hash.into();
        PasswordHash::new(&hash).map_err(|e| AuthError::InvalidHash(e.to_string()))?;
        Ok(Self { hash })
    }
}

#[async_trait]
impl AccessVerifier for Argon2AccessVerifier {
    async fn verify(&self, code: &str) -> Result<bool, AuthError> {
        let hash = self.hash.clone();
        let code = code.to_string();
        // Argon2 is CPU-bound; run it on the blocking pool.
        tokio::task::spawn_blocking(move || {
            let parsed =
                PasswordHash::new(&hash).map_err(|e| AuthError::InvalidHash(e.to_string()))?;
            match Argon2::default().verify_password(code.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AuthError::Verification(e.to_string())),
            }
        })
        .await
        .map_err(|e| AuthError::Verification(e.to_string()))?
    }
}
