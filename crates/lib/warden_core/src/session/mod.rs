// @awa-component: AUTH-SessionStore
//
//! Revocable session records backing otherwise stateless tokens.
//!
//! One record per (token kind, subject), stored as a hash with one field per
//! claim name and JSON-encoded values, under
//! `session:{environment}:{kind}_{subject}`. Writing a new record replaces
//! the previous one, which revokes the token it described. The store must be
//! shared by every instance serving the same environment.

pub mod memory;
pub mod redis;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::AuthError;
use crate::models::auth::{TokenClaims, TokenKind};

/// Address of a session record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    environment: String,
    kind: TokenKind,
    subject_id: String,
}

impl SessionKey {
    /// Key for `kind`/`subject_id` in `environment` (lower-cased).
    pub fn new(environment: &str, kind: TokenKind, subject_id: &str) -> Self {
        Self {
            environment: environment.to_lowercase(),
            kind,
            subject_id: subject_id.to_string(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "session:{}:{}_{}",
            self.environment, self.kind, self.subject_id
        )
    }
}

/// Wire form of a session record: claim name → JSON-encoded claim value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    fields: HashMap<String, String>,
}

impl SessionRecord {
    /// Encode every claim as its own field.
    pub fn from_claims(claims: &TokenClaims) -> Result<Self, AuthError> {
        let value = serde_json::to_value(claims)
            .map_err(|e| AuthError::Internal(format!("session encode: {e}")))?;
        let Value::Object(map) = value else {
            return Err(AuthError::Internal("session encode: claims are not an object".into()));
        };
        let mut fields = HashMap::with_capacity(map.len());
        for (name, claim) in map {
            fields.insert(name, claim.to_string());
        }
        Ok(Self { fields })
    }

    /// Wrap raw fields read back from a store.
    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The stored session id, if the field exists and decodes as a string.
    pub fn session_id(&self) -> Option<String> {
        let raw = self.fields.get("sid")?;
        serde_json::from_str::<String>(raw).ok()
    }

    /// Decode the record back into claims.
    pub fn to_claims(&self) -> Result<TokenClaims, AuthError> {
        let mut map = serde_json::Map::with_capacity(self.fields.len());
        for (name, raw) in &self.fields {
            let value: Value = serde_json::from_str(raw)
                .map_err(|e| AuthError::Internal(format!("session field '{name}': {e}")))?;
            map.insert(name.clone(), value);
        }
        serde_json::from_value(Value::Object(map))
            .map_err(|e| AuthError::Internal(format!("session decode: {e}")))
    }
}

/// TTL-backed key/value store holding session records.
///
/// `put` replaces the whole record (no field merging) and sets its expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Replace the record at `key` and expire it after `ttl`.
    async fn put(
        &self,
        key: &SessionKey,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), AuthError>;

    /// Read the live record at `key`.
    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>, AuthError>;

    /// Delete the record at `key`. Returns whether one existed.
    async fn remove(&self, key: &SessionKey) -> Result<bool, AuthError>;

    /// Reachability check.
    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }

    /// Store identifier for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::CLAIMS_VERSION;

    fn claims() -> TokenClaims {
        TokenClaims {
            ver: CLAIMS_VERSION,
            iss: "warden".into(),
            aud: vec!["warden-admin".into(), "warden-mobile".into()],
            exp: 1_900_000_000,
            iat: 1_899_998_200,
            sid: "6f1c".into(),
            sub: "7".into(),
            name: "Grace Hopper".into(),
            roles: vec![1, 3],
            email: Some("grace@example.com".into()),
        }
    }

    #[test]
    fn key_is_namespaced_by_lowercase_environment() {
        let key = SessionKey::new("Production", TokenKind::Access, "42");
        assert_eq!(key.to_string(), "session:production:access_42");
        let key = SessionKey::new("staging", TokenKind::Refresh, "42");
        assert_eq!(key.to_string(), "session:staging:refresh_42");
    }

    #[test]
    fn record_has_one_json_field_per_claim() {
        let record = SessionRecord::from_claims(&claims()).unwrap();
        let fields = record.fields();
        assert_eq!(fields["sid"], "\"6f1c\"");
        assert_eq!(fields["roles"], "[1,3]");
        assert_eq!(fields["exp"], "1900000000");
        assert_eq!(record.session_id().as_deref(), Some("6f1c"));
    }

    #[test]
    fn record_decodes_back_to_claims() {
        let record = SessionRecord::from_claims(&claims()).unwrap();
        let copy = SessionRecord::from_fields(record.fields().clone());
        assert_eq!(copy.to_claims().unwrap(), claims());
    }

    #[test]
    fn missing_sid_field_has_no_session_id() {
        let record = SessionRecord::from_fields(HashMap::from([("sub".into(), "\"1\"".into())]));
        assert!(record.session_id().is_none());
    }
}
