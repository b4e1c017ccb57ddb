//! Authentication domain models.
//!
//! `TokenClaims` is the single claim layout used by both the issuer and the
//! validator; claim names are fixed here and nowhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current claim-schema version written into every token.
pub const CLAIMS_VERSION: u16 = 1;

/// The two token kinds. Each has its own key, issuer and audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Text form used in session keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller.
///
/// Built by the credential verifier at login, embedded into token claims and
/// rebuilt from claims on every validated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub subject_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role_ids: Vec<i64>,
}

impl Identity {
    /// Build an identity, dropping duplicate role ids while keeping order.
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        role_ids: impl IntoIterator<Item = i64>,
    ) -> Self {
        let mut roles: Vec<i64> = Vec::new();
        for id in role_ids {
            if !roles.contains(&id) {
                roles.push(id);
            }
        }
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            email,
            role_ids: roles,
        }
    }

    /// Rebuild the identity embedded in validated claims.
    pub fn from_claims(claims: &TokenClaims) -> Self {
        Self::new(
            claims.sub.clone(),
            claims.name.clone(),
            claims.email.clone(),
            claims.roles.iter().copied(),
        )
    }
}

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Claim-schema version.
    #[serde(default)]
    pub ver: u16,
    /// Issuer configured for the token kind.
    pub iss: String,
    /// Audiences configured for the token kind.
    pub aud: Vec<String>,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Session id, matched against the session record on validation.
    #[serde(default)]
    pub sid: String,
    /// Subject id.
    #[serde(default)]
    pub sub: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Role ids.
    #[serde(default)]
    pub roles: Vec<i64>,
    /// Email, access tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

/// An access/refresh pair, always issued together.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Stored credential as read from the user store.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub subject_id: String,
    pub username: String,
    /// Base64 SHA-256 of `password ‖ salt`.
    pub password_hash: String,
    /// Base64 of the 16 salt bytes.
    pub password_salt: String,
    pub display_name: String,
    pub email: String,
    pub role_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_drops_duplicate_roles() {
        let identity = Identity::new("1", "Ada Admin", None, [3, 1, 3, 2, 1]);
        assert_eq!(identity.role_ids, vec![3, 1, 2]);
    }

    #[test]
    fn claims_without_session_fields_still_decode() {
        let json = r#"{"iss":"warden","aud":["warden"],"exp":10,"iat":0}"#;
        let claims: TokenClaims = serde_json::from_str(json).unwrap();
        assert!(claims.sid.is_empty());
        assert!(claims.sub.is_empty());
        assert_eq!(claims.ver, 0);
    }

    #[test]
    fn refresh_claims_omit_email() {
        let claims = TokenClaims {
            ver: CLAIMS_VERSION,
            iss: "warden".into(),
            aud: vec!["warden".into()],
            exp: 10,
            iat: 0,
            sid: "s".into(),
            sub: "1".into(),
            name: "n".into(),
            roles: vec![1],
            email: None,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert!(value.get("email").is_none());
    }

    #[test]
    fn token_kind_text_forms() {
        assert_eq!(TokenKind::Access.to_string(), "access");
        assert_eq!(TokenKind::Refresh.as_str(), "refresh");
    }
}
