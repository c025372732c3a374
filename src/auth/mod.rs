//! Operator authentication

pub mod operator;
pub mod verifier;

pub use operator::Operator;
pub use verifier::{hash_access_code, AccessVerifier, Argon2AccessVerifier, AuthError};
