// @awa-component: GATE-AccessGate
//
//! Per-request access gate.
//!
//! Runs `Unauthenticated → TokenValidated → RoleResolved → PathMatched` and
//! stops at the first failing stage. Token rejections end as
//! [`GateOutcome::Unauthenticated`], engine denials as
//! [`GateOutcome::Forbidden`]; store failures are errors.

use tracing::{debug, warn};

use crate::auth::AuthError;
use crate::auth::validator::{MalformedReason, Rejection, TokenCheck, TokenValidator};
use crate::models::auth::{Identity, TokenKind};
use crate::models::permission::Action;
use crate::permissions::engine::{AuthorizationEngine, Decision, DenyReason};

/// Terminal state of a gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Allowed(Identity),
    Unauthenticated(Rejection),
    Forbidden(DenyReason),
}

/// Token validation followed by CRUD authorization.
#[derive(Clone)]
pub struct AccessGate {
    validator: TokenValidator,
    engine: AuthorizationEngine,
}

impl AccessGate {
    pub fn new(validator: TokenValidator, engine: AuthorizationEngine) -> Self {
        Self { validator, engine }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    /// Validate `token` as `kind` only.
    pub async fn authenticate(
        &self,
        token: Option<&str>,
        kind: TokenKind,
    ) -> Result<Result<Identity, Rejection>, AuthError> {
        let Some(token) = token else {
            debug!(%kind, "No token presented");
            return Ok(Err(Rejection::Malformed(MalformedReason::Absent)));
        };
        match self.validator.validate(token, kind).await? {
            TokenCheck::Valid(identity) => Ok(Ok(identity)),
            TokenCheck::Rejected(rejection) => Ok(Err(rejection)),
        }
    }

    /// Authorize an already validated identity.
    pub async fn authorize(
        &self,
        identity: &Identity,
        action: Action,
        path: &str,
    ) -> Result<Decision, AuthError> {
        debug!(subject = %identity.subject_id, roles = ?identity.role_ids, "Roles resolved");
        self.engine.authorize(&identity.role_ids, action, path).await
    }

    /// Full gate: access token, then `action` on `path`.
    pub async fn check(
        &self,
        token: Option<&str>,
        action: Action,
        path: &str,
    ) -> Result<GateOutcome, AuthError> {
        let identity = match self.authenticate(token, TokenKind::Access).await? {
            Ok(identity) => identity,
            Err(rejection) => return Ok(GateOutcome::Unauthenticated(rejection)),
        };
        debug!(subject = %identity.subject_id, "Token validated");

        match self.authorize(&identity, action, path).await? {
            Decision::Allow { matched } => {
                debug!(subject = %identity.subject_id, %action, path, matched = %matched, "Path matched");
                Ok(GateOutcome::Allowed(identity))
            }
            Decision::Deny(reason) => {
                warn!(subject = %identity.subject_id, %action, path, %reason, "Access denied");
                Ok(GateOutcome::Forbidden(reason))
            }
        }
    }
}
