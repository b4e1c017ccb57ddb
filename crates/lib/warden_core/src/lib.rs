//! # warden_core
//!
//! Credential verification, signed session tokens with server-side
//! revocation, and cached role/menu CRUD authorization.

pub mod auth;
pub mod config;
pub mod deadline;
pub mod gate;
pub mod migrate;
pub mod models;
pub mod permissions;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::TimeDelta;

    use crate::config::{AuthConfig, SigningConfig};
    use crate::models::auth::Identity;

    pub fn auth_config() -> AuthConfig {
        let access = SigningConfig::new(
            "access-secret-for-tests",
            "warden",
            ["warden-admin"],
            TimeDelta::minutes(30),
        );
        let refresh = SigningConfig::new(
            "refresh-secret-for-tests",
            "warden-refresh",
            ["warden-admin"],
            TimeDelta::days(1),
        );
        let mut config = AuthConfig::new(access, refresh);
        config.environment = "test".into();
        config
    }

    pub fn identity() -> Identity {
        Identity::new("42", "Ada Admin", Some("ada@example.com".into()), [1, 2])
    }
}
