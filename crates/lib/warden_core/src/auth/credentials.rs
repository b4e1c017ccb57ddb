// @awa-component: AUTH-CredentialVerifier
//
//! Username/password verification against stored salted digests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use super::AuthError;
use super::password::{HashedPassword, verify_password};
use crate::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use crate::models::auth::{CredentialRecord, Identity};

/// Read access to stored credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Active credential for `username`, matched case-insensitively, with the
    /// subject's active role ids.
    async fn find_active_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, AuthError>;

    /// Reachability check.
    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// In-memory credential store keyed by lower-cased username.
#[derive(Default)]
pub struct StaticCredentials {
    records: DashMap<String, CredentialRecord>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: CredentialRecord) {
        self.records.insert(record.username.to_lowercase(), record);
    }

    /// Hash `password` under a fresh salt and insert the resulting record.
    pub fn add_user(
        &self,
        subject_id: &str,
        username: &str,
        password: &str,
        display_name: &str,
        email: &str,
        role_ids: &[i64],
    ) {
        let hashed = HashedPassword::new(password);
        self.insert(CredentialRecord {
            subject_id: subject_id.to_string(),
            username: username.to_string(),
            password_hash: hashed.hash,
            password_salt: hashed.salt,
            display_name: display_name.to_string(),
            email: email.to_string(),
            role_ids: role_ids.to_vec(),
        });
    }

    /// Drop a user, as if deactivated.
    pub fn remove(&self, username: &str) -> bool {
        self.records.remove(&username.to_lowercase()).is_some()
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn find_active_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        Ok(self
            .records
            .get(&username.to_lowercase())
            .map(|r| r.value().clone()))
    }
}

/// Checks presented credentials and builds the caller's [`Identity`].
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    timeout: Duration,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// `Some(identity)` on a match, `None` for an unknown user or a wrong
    /// password alike. Store failures are errors, not `None`.
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Identity>, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            debug!("Empty username or password");
            return Ok(None);
        }

        let record = bounded(
            self.timeout,
            "credential lookup",
            self.store.find_active_by_username(username),
        )
        .await?;

        let Some(record) = record else {
            warn!(username, "Login rejected");
            return Ok(None);
        };
        if !verify_password(password, &record.password_hash, &record.password_salt) {
            warn!(username, "Login rejected");
            return Ok(None);
        }

        let email = Some(record.email).filter(|e| !e.is_empty());
        Ok(Some(Identity::new(
            record.subject_id,
            record.display_name,
            email,
            record.role_ids,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl CredentialStore for FailingStore {
        async fn find_active_by_username(
            &self,
            _username: &str,
        ) -> Result<Option<CredentialRecord>, AuthError> {
            Err(AuthError::DependencyUnavailable("database: refused".into()))
        }
    }

    struct HangingStore;

    #[async_trait]
    impl CredentialStore for HangingStore {
        async fn find_active_by_username(
            &self,
            _username: &str,
        ) -> Result<Option<CredentialRecord>, AuthError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    fn verifier() -> CredentialVerifier {
        let store = StaticCredentials::new();
        store.add_user("1", "admin", "123456", "System Admin", "admin@example.com", &[1, 2, 1]);
        CredentialVerifier::new(Arc::new(store))
    }

    #[tokio::test]
    async fn correct_password_yields_identity() {
        let identity = verifier().verify("admin", "123456").await.unwrap().unwrap();
        assert_eq!(identity.subject_id, "1");
        assert_eq!(identity.display_name, "System Admin");
        assert_eq!(identity.email.as_deref(), Some("admin@example.com"));
        assert_eq!(identity.role_ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn username_is_case_insensitive() {
        assert!(verifier().verify("ADMIN", "123456").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let v = verifier();
        assert!(v.verify("admin", "1234567").await.unwrap().is_none());
        assert!(v.verify("nobody", "123456").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_inputs_are_rejected_without_lookup() {
        let v = CredentialVerifier::new(Arc::new(FailingStore));
        assert!(v.verify("", "123456").await.unwrap().is_none());
        assert!(v.verify("admin", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rehashed_record_still_rejects_other_passwords() {
        let store = StaticCredentials::new();
        store.add_user("1", "admin", "123456", "A", "", &[1]);
        store.add_user("1", "admin", "123456", "A", "", &[1]);
        let v = CredentialVerifier::new(Arc::new(store));
        assert!(v.verify("admin", "123456").await.unwrap().is_some());
        assert!(v.verify("admin", "654321").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_email_becomes_none() {
        let store = StaticCredentials::new();
        store.add_user("2", "ops", "pw", "Ops User", "", &[]);
        let v = CredentialVerifier::new(Arc::new(store));
        let identity = v.verify("ops", "pw").await.unwrap().unwrap();
        assert!(identity.email.is_none());
        assert!(identity.role_ids.is_empty());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let v = CredentialVerifier::new(Arc::new(FailingStore));
        assert!(matches!(
            v.verify("admin", "123456").await,
            Err(AuthError::DependencyUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out() {
        let v = CredentialVerifier::new(Arc::new(HangingStore))
            .with_timeout(Duration::from_millis(20));
        assert!(matches!(
            v.verify("admin", "123456").await,
            Err(AuthError::DependencyUnavailable(_))
        ));
    }
}
