// @awa-component: AUTH-TokenValidator
//
//! Token validation: signature and claims, then session liveness.
//!
//! Each step is a hard gate; the first failure decides the outcome. Expected
//! rejections come back as [`TokenCheck::Rejected`], while session-store
//! failures are errors so that an outage never reads as a revoked session.

use std::sync::Arc;

use tracing::{debug, warn};

use super::jwt::{self, VerifyFailure};
use super::{AuthError, constant_time_eq};
use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::models::auth::{CLAIMS_VERSION, Identity, TokenClaims, TokenKind};
use crate::session::{SessionKey, SessionStore};

/// Why a token is not structurally acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// No token was presented.
    Absent,
    Encoding,
    Signature,
    Algorithm,
    Issuer,
    Audience,
    /// `sid` or `sub` missing or empty.
    MissingClaims,
    UnsupportedVersion,
}

impl MalformedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MalformedReason::Absent => "absent",
            MalformedReason::Encoding => "encoding",
            MalformedReason::Signature => "signature",
            MalformedReason::Algorithm => "algorithm",
            MalformedReason::Issuer => "issuer",
            MalformedReason::Audience => "audience",
            MalformedReason::MissingClaims => "missing claims",
            MalformedReason::UnsupportedVersion => "unsupported version",
        }
    }
}

/// A classified token rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Expired,
    /// Superseded by a newer token of the same kind, or explicitly revoked.
    SessionRevoked,
    Malformed(MalformedReason),
}

impl Rejection {
    /// Log category.
    pub fn category(&self) -> &'static str {
        match self {
            Rejection::Expired => "expired",
            Rejection::SessionRevoked => "session_revoked",
            Rejection::Malformed(_) => "malformed",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Expired => f.write_str("token expired"),
            Rejection::SessionRevoked => f.write_str("session revoked"),
            Rejection::Malformed(reason) => write!(f, "malformed token ({})", reason.as_str()),
        }
    }
}

impl From<VerifyFailure> for Rejection {
    fn from(failure: VerifyFailure) -> Self {
        match failure {
            VerifyFailure::Expired => Rejection::Expired,
            VerifyFailure::Encoding => Rejection::Malformed(MalformedReason::Encoding),
            VerifyFailure::Signature => Rejection::Malformed(MalformedReason::Signature),
            VerifyFailure::Algorithm => Rejection::Malformed(MalformedReason::Algorithm),
            VerifyFailure::Issuer => Rejection::Malformed(MalformedReason::Issuer),
            VerifyFailure::Audience => Rejection::Malformed(MalformedReason::Audience),
        }
    }
}

/// Outcome of [`TokenValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck {
    Valid(Identity),
    Rejected(Rejection),
}

/// Validates presented tokens against signing config and the session store.
#[derive(Clone)]
pub struct TokenValidator {
    config: Arc<AuthConfig>,
    sessions: Arc<dyn SessionStore>,
}

impl TokenValidator {
    pub fn new(config: Arc<AuthConfig>, sessions: Arc<dyn SessionStore>) -> Self {
        if !config.session_check_enabled {
            warn!("Session liveness check disabled; revoked tokens stay valid until expiry");
        }
        Self { config, sessions }
    }

    /// Validate `raw` as a token of `expected` kind.
    pub async fn validate(&self, raw: &str, expected: TokenKind) -> Result<TokenCheck, AuthError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(self.reject(expected, Rejection::Malformed(MalformedReason::Absent)));
        }

        let claims = match jwt::verify(raw, expected, self.config.signing(expected))? {
            Ok(claims) => claims,
            Err(failure) => return Ok(self.reject(expected, failure.into())),
        };

        if claims.sid.is_empty() || claims.sub.is_empty() {
            return Ok(self.reject(expected, Rejection::Malformed(MalformedReason::MissingClaims)));
        }
        if claims.ver != CLAIMS_VERSION {
            return Ok(self.reject(
                expected,
                Rejection::Malformed(MalformedReason::UnsupportedVersion),
            ));
        }

        if self.config.session_check_enabled && !self.session_is_live(expected, &claims).await? {
            return Ok(self.reject(expected, Rejection::SessionRevoked));
        }

        debug!(subject = %claims.sub, kind = %expected, "Token validated");
        Ok(TokenCheck::Valid(Identity::from_claims(&claims)))
    }

    async fn session_is_live(&self, kind: TokenKind, claims: &TokenClaims) -> Result<bool, AuthError> {
        let key = SessionKey::new(&self.config.environment, kind, &claims.sub);
        let record = bounded(
            self.config.store_timeout,
            "session read",
            self.sessions.get(&key),
        )
        .await?;
        let Some(stored) = record.and_then(|r| r.session_id()) else {
            return Ok(false);
        };
        Ok(constant_time_eq(stored.as_bytes(), claims.sid.as_bytes()))
    }

    fn reject(&self, kind: TokenKind, rejection: Rejection) -> TokenCheck {
        warn!(%kind, reason = rejection.category(), detail = %rejection, "Token rejected");
        TokenCheck::Rejected(rejection)
    }
}
