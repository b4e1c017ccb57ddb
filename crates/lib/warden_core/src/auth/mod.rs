//! Authentication logic.
//!
//! Salted password digests, credential lookup, JWT signing and the
//! issue/validate pair that binds every token to a revocable session record.
//!
//! Expected rejections (bad password, expired or revoked token) are returned
//! as tagged outcomes. `AuthError` is reserved for misconfiguration and for
//! dependency failures, so an outage is never reported as a denial.

pub mod credentials;
pub mod issuer;
pub mod jwt;
pub mod password;
pub mod queries;
pub mod validator;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or invalid signing configuration. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Session store or relational store timed out or refused the call.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::DependencyUnavailable(format!("database: {e}"))
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(e: redis::RedisError) -> Self {
        AuthError::DependencyUnavailable(format!("session store: {e}"))
    }
}

/// Compare two byte strings without early exit on the first difference.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}
