//! JWT signing and verification for both token kinds.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::AuthError;
use crate::config::SigningConfig;
use crate::models::auth::{TokenClaims, TokenKind};

/// Why a token failed cryptographic or claim-level verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyFailure {
    Expired,
    Encoding,
    Signature,
    Algorithm,
    Issuer,
    Audience,
}

/// Sign `claims` with the key, algorithm and header for `kind`.
pub fn sign(
    claims: &TokenClaims,
    kind: TokenKind,
    signing: &SigningConfig,
) -> Result<String, AuthError> {
    signing.check(kind)?;
    let key = EncodingKey::from_secret(signing.secret_bytes(kind)?);
    encode(&Header::new(signing.algorithm), claims, &key)
        .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Verify signature, algorithm, issuer, audience and expiry.
///
/// Only the configured algorithm is accepted and expiry has no leeway: a
/// token is live only while `now < exp`.
/// A configuration problem is an `Err(AuthError)`; a bad token is
/// `Ok(Err(VerifyFailure))`.
pub fn verify(
    token: &str,
    kind: TokenKind,
    signing: &SigningConfig,
) -> Result<Result<TokenClaims, VerifyFailure>, AuthError> {
    signing.check(kind)?;
    let key = DecodingKey::from_secret(signing.secret_bytes(kind)?);

    let mut validation = Validation::new(signing.algorithm);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_issuer(&[signing.issuer.as_str()]);
    validation.set_audience(signing.audience.as_slice());
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);

    match decode::<TokenClaims>(token, &key, &validation) {
        // jsonwebtoken still accepts `exp == now`.
        Ok(data) if data.claims.exp <= Utc::now().timestamp() => Ok(Err(VerifyFailure::Expired)),
        Ok(data) => Ok(Ok(data.claims)),
        Err(e) => Ok(Err(classify(e.kind()))),
    }
}

fn classify(kind: &ErrorKind) -> VerifyFailure {
    match kind {
        ErrorKind::ExpiredSignature => VerifyFailure::Expired,
        ErrorKind::InvalidSignature => VerifyFailure::Signature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => VerifyFailure::Algorithm,
        ErrorKind::InvalidIssuer => VerifyFailure::Issuer,
        ErrorKind::InvalidAudience => VerifyFailure::Audience,
        _ => VerifyFailure::Encoding,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::models::auth::CLAIMS_VERSION;

    fn signing() -> SigningConfig {
        SigningConfig::new("access-secret", "warden", ["warden-admin"], TimeDelta::minutes(30))
    }

    fn claims(exp_offset_secs: i64) -> TokenClaims {
        let now = Utc::now().timestamp();
        TokenClaims {
            ver: CLAIMS_VERSION,
            iss: "warden".into(),
            aud: vec!["warden-admin".into()],
            exp: now + exp_offset_secs,
            iat: now,
            sid: "sid-1".into(),
            sub: "42".into(),
            name: "Ada Admin".into(),
            roles: vec![1, 2],
            email: Some("ada@example.com".into()),
        }
    }

    #[test]
    fn signed_token_verifies() {
        let token = sign(&claims(600), TokenKind::Access, &signing()).unwrap();
        let decoded = verify(&token, TokenKind::Access, &signing()).unwrap().unwrap();
        assert_eq!(decoded.sub, "42");
        assert_eq!(decoded.roles, vec![1, 2]);
    }

    #[test]
    fn expired_token_is_classified() {
        let token = sign(&claims(-120), TokenKind::Access, &signing()).unwrap();
        assert_eq!(
            verify(&token, TokenKind::Access, &signing()).unwrap(),
            Err(VerifyFailure::Expired)
        );
    }

    #[test]
    fn token_is_expired_at_its_exp_second() {
        let token = sign(&claims(0), TokenKind::Access, &signing()).unwrap();
        assert_eq!(
            verify(&token, TokenKind::Access, &signing()).unwrap(),
            Err(VerifyFailure::Expired)
        );
    }

    #[test]
    fn other_key_fails_signature() {
        let token = sign(&claims(600), TokenKind::Access, &signing()).unwrap();
        let mut other = signing();
        other.secret = Some("different".into());
        assert_eq!(
            verify(&token, TokenKind::Access, &other).unwrap(),
            Err(VerifyFailure::Signature)
        );
    }

    #[test]
    fn algorithm_must_match_exactly() {
        let token = sign(
            &claims(600),
            TokenKind::Access,
            &signing().with_algorithm(Algorithm::HS512),
        )
        .unwrap();
        assert_eq!(
            verify(&token, TokenKind::Access, &signing()).unwrap(),
            Err(VerifyFailure::Algorithm)
        );
    }

    #[test]
    fn wrong_audience_and_issuer_are_rejected() {
        let token = sign(&claims(600), TokenKind::Access, &signing()).unwrap();

        let mut other_aud = signing();
        other_aud.audience = vec!["someone-else".into()];
        assert_eq!(
            verify(&token, TokenKind::Access, &other_aud).unwrap(),
            Err(VerifyFailure::Audience)
        );

        let mut other_iss = signing();
        other_iss.issuer = "elsewhere".into();
        assert_eq!(
            verify(&token, TokenKind::Access, &other_iss).unwrap(),
            Err(VerifyFailure::Issuer)
        );
    }

    #[test]
    fn garbage_is_an_encoding_failure() {
        assert_eq!(
            verify("not.a.jwt", TokenKind::Access, &signing()).unwrap(),
            Err(VerifyFailure::Encoding)
        );
    }

    #[test]
    fn missing_secret_is_an_error_not_a_rejection() {
        let mut cfg = signing();
        cfg.secret = None;
        assert!(matches!(
            sign(&claims(600), TokenKind::Access, &cfg),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            verify("x.y.z", TokenKind::Access, &cfg),
            Err(AuthError::Configuration(_))
        ));
    }
}
