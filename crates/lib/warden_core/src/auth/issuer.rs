// @awa-component: AUTH-TokenIssuer
//
//! Token issuance bound to a session record.
//!
//! Every issued token overwrites the session record for its (kind, subject),
//! so the previously issued token of that kind stops validating.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuthError, jwt};
use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::models::auth::{CLAIMS_VERSION, IssuedToken, Identity, TokenClaims, TokenKind, TokenPair};
use crate::session::{SessionKey, SessionRecord, SessionStore};

/// Signs tokens and records their sessions.
#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<AuthConfig>,
    sessions: Arc<dyn SessionStore>,
}

impl TokenIssuer {
    pub fn new(config: Arc<AuthConfig>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { config, sessions }
    }

    /// Issue one token of `kind` for `identity`, valid from `now`.
    pub async fn issue(
        &self,
        kind: TokenKind,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let signing = self.config.signing(kind);
        signing.check(kind)?;
        if identity.subject_id.is_empty() {
            return Err(AuthError::Internal("identity has no subject id".into()));
        }

        let session_id = Uuid::new_v4().to_string();
        let expires_at = now + signing.lifetime;
        let claims = TokenClaims {
            ver: CLAIMS_VERSION,
            iss: signing.issuer.clone(),
            aud: signing.audience.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            sid: session_id.clone(),
            sub: identity.subject_id.clone(),
            name: identity.display_name.clone(),
            roles: identity.role_ids.clone(),
            email: match kind {
                TokenKind::Access => identity.email.clone(),
                TokenKind::Refresh => None,
            },
        };
        let token = jwt::sign(&claims, kind, signing)?;

        let key = SessionKey::new(&self.config.environment, kind, &identity.subject_id);
        let record = SessionRecord::from_claims(&claims)?;
        let ttl = (expires_at - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .max(Duration::from_secs(1));
        bounded(
            self.config.store_timeout,
            "session write",
            self.sessions.put(&key, &record, ttl),
        )
        .await?;
        debug!(subject = %identity.subject_id, %kind, ttl_secs = ttl.as_secs(), "Token issued");

        Ok(IssuedToken {
            token,
            session_id,
            expires_at,
        })
    }

    /// Issue access and refresh tokens concurrently. Either failing fails both.
    pub async fn issue_pair(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let (access, refresh) = tokio::try_join!(
            self.issue(TokenKind::Access, identity, now),
            self.issue(TokenKind::Refresh, identity, now),
        )?;
        info!(subject = %identity.subject_id, "Token pair issued");
        Ok(TokenPair { access, refresh })
    }

    /// Delete the session record of `kind` for `subject_id`.
    pub async fn revoke(&self, kind: TokenKind, subject_id: &str) -> Result<bool, AuthError> {
        let key = SessionKey::new(&self.config.environment, kind, subject_id);
        bounded(
            self.config.store_timeout,
            "session delete",
            self.sessions.remove(&key),
        )
        .await
    }

    /// Revoke both kinds for `subject_id`.
    pub async fn revoke_all(&self, subject_id: &str) -> Result<(), AuthError> {
        tokio::try_join!(
            self.revoke(TokenKind::Access, subject_id),
            self.revoke(TokenKind::Refresh, subject_id),
        )?;
        info!(subject = subject_id, "Sessions revoked");
        Ok(())
    }
}
