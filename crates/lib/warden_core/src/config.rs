//! Token, session and cache configuration.

use std::time::Duration;

use chrono::TimeDelta;
use jsonwebtoken::Algorithm;

use crate::auth::AuthError;
use crate::deadline::DEFAULT_STORE_TIMEOUT;
use crate::models::auth::TokenKind;

/// Access token lifetime: 30 minutes.
pub const ACCESS_TOKEN_LIFETIME_SECS: i64 = 30 * 60;

/// Refresh token lifetime: 1 day.
pub const REFRESH_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Permission cache TTL: 30 minutes.
pub const PERMISSION_CACHE_TTL_SECS: i64 = 30 * 60;

/// Signing material for one token kind.
#[derive(Clone)]
pub struct SigningConfig {
    /// HMAC secret. `None` makes every issue/validate of this kind fail.
    pub secret: Option<String>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub algorithm: Algorithm,
    pub lifetime: TimeDelta,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl SigningConfig {
    /// HS256 config with the given secret, issuer and audiences.
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl IntoIterator<Item = impl Into<String>>,
        lifetime: TimeDelta,
    ) -> Self {
        Self {
            secret: Some(secret.into()),
            issuer: issuer.into(),
            audience: audience.into_iter().map(Into::into).collect(),
            algorithm: Algorithm::HS256,
            lifetime,
        }
    }

    /// Sets the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The secret bytes, or a configuration error naming the kind.
    pub fn secret_bytes(&self, kind: TokenKind) -> Result<&[u8], AuthError> {
        match self.secret.as_deref() {
            Some(s) if !s.is_empty() => Ok(s.as_bytes()),
            _ => Err(AuthError::Configuration(format!(
                "signing secret for {kind} tokens is not configured"
            ))),
        }
    }

    /// Reject configs that could never produce a verifiable token.
    pub fn check(&self, kind: TokenKind) -> Result<(), AuthError> {
        self.secret_bytes(kind)?;
        if self.issuer.is_empty() {
            return Err(AuthError::Configuration(format!(
                "issuer for {kind} tokens is not configured"
            )));
        }
        if self.audience.is_empty() {
            return Err(AuthError::Configuration(format!(
                "audience for {kind} tokens is not configured"
            )));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::Configuration(format!(
                "{kind} tokens must use an HMAC algorithm, got {:?}",
                self.algorithm
            )));
        }
        Ok(())
    }
}

/// Configuration for issuing/validating tokens and resolving permissions.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub access: SigningConfig,
    pub refresh: SigningConfig,
    /// Deployment environment, namespaces session keys.
    pub environment: String,
    /// Whether validation consults the session store.
    pub session_check_enabled: bool,
    /// Absolute TTL of permission cache entries.
    pub permission_cache_ttl: TimeDelta,
    /// Upper bound on every session/relational store call.
    pub store_timeout: Duration,
}

impl AuthConfig {
    /// Config with default environment, TTLs and timeouts.
    pub fn new(access: SigningConfig, refresh: SigningConfig) -> Self {
        Self {
            access,
            refresh,
            environment: "development".into(),
            session_check_enabled: true,
            permission_cache_ttl: TimeDelta::seconds(PERMISSION_CACHE_TTL_SECS),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Signing material for `kind`.
    pub fn signing(&self, kind: TokenKind) -> &SigningConfig {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable                          | Default        |
    /// |-----------------------------------|----------------|
    /// | `ACCESS_TOKEN_SECRET`             | unset (error on use) |
    /// | `ACCESS_TOKEN_ISSUER`             | `warden`       |
    /// | `ACCESS_TOKEN_AUDIENCE`           | `warden` (comma-separated) |
    /// | `ACCESS_TOKEN_ALGORITHM`          | `HS256`        |
    /// | `ACCESS_TOKEN_LIFETIME_SECS`      | `1800`         |
    /// | `REFRESH_TOKEN_*`                 | same, lifetime `86400` |
    /// | `APP_ENVIRONMENT`                 | `development`  |
    /// | `SESSION_CHECK_ENABLED`           | `true`         |
    /// | `PERMISSION_CACHE_TTL_SECS`       | `1800`         |
    /// | `STORE_TIMEOUT_MS`                | `3000`         |
    pub fn from_env() -> Result<Self, AuthError> {
        let access = signing_from_env("ACCESS_TOKEN", ACCESS_TOKEN_LIFETIME_SECS)?;
        let refresh = signing_from_env("REFRESH_TOKEN", REFRESH_TOKEN_LIFETIME_SECS)?;
        let mut config = Self::new(access, refresh);
        if let Some(env) = env_non_empty("APP_ENVIRONMENT") {
            config.environment = env;
        }
        if let Some(flag) = env_non_empty("SESSION_CHECK_ENABLED") {
            config.session_check_enabled = parse_bool("SESSION_CHECK_ENABLED", &flag)?;
        }
        if let Some(ttl) = env_non_empty("PERMISSION_CACHE_TTL_SECS") {
            config.permission_cache_ttl =
                TimeDelta::seconds(parse_num("PERMISSION_CACHE_TTL_SECS", &ttl)?);
        }
        if let Some(ms) = env_non_empty("STORE_TIMEOUT_MS") {
            config.store_timeout = Duration::from_millis(parse_num("STORE_TIMEOUT_MS", &ms)?);
        }
        Ok(config)
    }
}

fn signing_from_env(prefix: &str, default_lifetime: i64) -> Result<SigningConfig, AuthError> {
    let algorithm = match env_non_empty(&format!("{prefix}_ALGORITHM")) {
        Some(raw) => raw
            .parse::<Algorithm>()
            .map_err(|e| AuthError::Configuration(format!("{prefix}_ALGORITHM: {e}")))?,
        None => Algorithm::HS256,
    };
    let lifetime = match env_non_empty(&format!("{prefix}_LIFETIME_SECS")) {
        Some(raw) => parse_num(&format!("{prefix}_LIFETIME_SECS"), &raw)?,
        None => default_lifetime,
    };
    let audience = env_non_empty(&format!("{prefix}_AUDIENCE"))
        .map(|raw| split_list(&raw))
        .unwrap_or_else(|| vec!["warden".to_string()]);
    Ok(SigningConfig {
        secret: env_non_empty(&format!("{prefix}_SECRET")),
        issuer: env_non_empty(&format!("{prefix}_ISSUER")).unwrap_or_else(|| "warden".into()),
        audience,
        algorithm,
        lifetime: TimeDelta::seconds(lifetime),
    })
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, AuthError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AuthError::Configuration(format!(
            "{name}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_num<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, AuthError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| AuthError::Configuration(format!("{name}: {e}")))
}
