// @awa-component: PRM-PermissionCache
//
//! Cache-aside permission sets keyed by `(role_id, category)`.
//!
//! Entries expire after an absolute TTL or when a grant change is reported
//! through [`GrantChangeHook`]. An empty set is a valid cached value.
//! Relational failures are returned to the caller and never cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{GrantSource, PermissionSet};
use crate::auth::AuthError;
use crate::config::PERMISSION_CACHE_TTL_SECS;
use crate::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use crate::models::permission::MenuCategory;

#[derive(Debug, Clone)]
struct CacheEntry {
    grants: PermissionSet,
    expires_at: DateTime<Utc>,
}

/// Notified by the owner of grant writes after any role/menu grant mutation.
#[async_trait]
pub trait GrantChangeHook: Send + Sync {
    /// Grants of `role_id` changed. `None` means any category.
    async fn grants_changed(&self, role_id: i64, category: Option<MenuCategory>);
}

/// Per-role permission cache in front of a [`GrantSource`].
pub struct PermissionCache {
    source: Arc<dyn GrantSource>,
    entries: RwLock<HashMap<(i64, MenuCategory), CacheEntry>>,
    // Bumped on every invalidation so a fill that raced one is discarded.
    generation: AtomicU64,
    ttl: TimeDelta,
    timeout: Duration,
}

impl PermissionCache {
    /// Cache with the default 30-minute TTL.
    pub fn new(source: Arc<dyn GrantSource>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            ttl: TimeDelta::seconds(PERMISSION_CACHE_TTL_SECS),
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn source(&self) -> &Arc<dyn GrantSource> {
        &self.source
    }

    /// Permission set of `role_id` for `category`, loading it on a miss.
    pub async fn resolve(
        &self,
        role_id: i64,
        category: MenuCategory,
    ) -> Result<PermissionSet, AuthError> {
        let key = (role_id, category);
        if let Some(entry) = self.entries.read().await.get(&key)
            && Utc::now() < entry.expires_at
        {
            debug!(role_id, %category, "Permission cache hit");
            return Ok(entry.grants.clone());
        }

        debug!(role_id, %category, "Permission cache miss");
        let generation = self.generation.load(Ordering::Acquire);
        let grants = bounded(
            self.timeout,
            "grant lookup",
            self.source.active_grants(role_id, category),
        )
        .await?;
        let grants: PermissionSet = Arc::new(grants);

        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            entries.insert(
                key,
                CacheEntry {
                    grants: grants.clone(),
                    expires_at: Utc::now() + self.ttl,
                },
            );
        }
        Ok(grants)
    }

    /// Drop the entry for `(role_id, category)`.
    pub async fn invalidate(&self, role_id: i64, category: MenuCategory) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.remove(&(role_id, category));
        debug!(role_id, %category, "Permission cache invalidated");
    }

    /// Drop every category for `role_id`.
    pub async fn invalidate_role(&self, role_id: i64) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.retain(|(role, _), _| *role != role_id);
        debug!(role_id, "Permission cache invalidated for role");
    }

    /// Drop everything.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    /// Number of cached entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl GrantChangeHook for PermissionCache {
    async fn grants_changed(&self, role_id: i64, category: Option<MenuCategory>) {
        match category {
            Some(category) => self.invalidate(role_id, category).await,
            None => self.invalidate_role(role_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permission::Action;
    use crate::permissions::StaticGrants;
    use crate::permissions::fixtures::{grant, page};

    fn cache(source: &Arc<StaticGrants>) -> PermissionCache {
        PermissionCache::new(source.clone())
    }

    #[tokio::test]
    async fn second_resolve_is_served_from_cache() {
        let source = Arc::new(StaticGrants::new(vec![grant(1, 1, "/users", &[Action::Read])]));
        let cache = cache(&source);
        assert_eq!(cache.resolve(1, MenuCategory::Api).await.unwrap().len(), 1);
        assert_eq!(cache.resolve(1, MenuCategory::Api).await.unwrap().len(), 1);
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn empty_set_is_cached() {
        let source = Arc::new(StaticGrants::default());
        let cache = cache(&source);
        assert!(cache.resolve(9, MenuCategory::Api).await.unwrap().is_empty());
        assert!(cache.resolve(9, MenuCategory::Api).await.unwrap().is_empty());
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn categories_are_cached_separately() {
        let source = Arc::new(StaticGrants::new(vec![
            grant(1, 1, "/api/users", &[Action::Read]),
            page(1, 2, "/users"),
        ]));
        let cache = cache(&source);
        let api = cache.resolve(1, MenuCategory::Api).await.unwrap();
        let pages = cache.resolve(1, MenuCategory::Page).await.unwrap();
        assert_eq!(api[0].menu_id, 1);
        assert_eq!(pages[0].menu_id, 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn invalidate_reflects_committed_change() {
        let source = Arc::new(StaticGrants::new(vec![grant(1, 1, "/users", &[Action::Read])]));
        let cache = cache(&source);
        assert!(!cache.resolve(1, MenuCategory::Api).await.unwrap()[0].can_update);

        source.upsert(grant(1, 1, "/users", &[Action::Read, Action::Update])).await;
        // Still stale until invalidated.
        assert!(!cache.resolve(1, MenuCategory::Api).await.unwrap()[0].can_update);

        cache.invalidate(1, MenuCategory::Api).await;
        assert!(cache.resolve(1, MenuCategory::Api).await.unwrap()[0].can_update);
    }

    #[tokio::test]
    async fn hook_without_category_drops_whole_role() {
        let source = Arc::new(StaticGrants::new(vec![
            grant(1, 1, "/a", &[Action::Read]),
            page(1, 2, "/b"),
            grant(2, 3, "/c", &[Action::Read]),
        ]));
        let cache = cache(&source);
        cache.resolve(1, MenuCategory::Api).await.unwrap();
        cache.resolve(1, MenuCategory::Page).await.unwrap();
        cache.resolve(2, MenuCategory::Api).await.unwrap();

        cache.grants_changed(1, None).await;
        assert_eq!(cache.len().await, 1);

        cache.grants_changed(2, Some(MenuCategory::Api)).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn expired_entry_is_reloaded() {
        let source = Arc::new(StaticGrants::new(vec![grant(1, 1, "/a", &[Action::Read])]));
        let cache = cache(&source).with_ttl(TimeDelta::zero());
        cache.resolve(1, MenuCategory::Api).await.unwrap();
        cache.resolve(1, MenuCategory::Api).await.unwrap();
        assert_eq!(source.query_count(), 2);
    }

    struct BrokenSource;

    #[async_trait]
    impl GrantSource for BrokenSource {
        async fn active_grants(
            &self,
            _role_id: i64,
            _category: MenuCategory,
        ) -> Result<Vec<crate::models::permission::RoleMenuGrant>, AuthError> {
            Err(AuthError::DependencyUnavailable("database: gone".into()))
        }
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = PermissionCache::new(Arc::new(BrokenSource));
        assert!(matches!(
            cache.resolve(1, MenuCategory::Api).await,
            Err(AuthError::DependencyUnavailable(_))
        ));
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let source = Arc::new(StaticGrants::new(vec![grant(1, 1, "/a", &[Action::Read])]));
        let cache = cache(&source);
        cache.resolve(1, MenuCategory::Api).await.unwrap();
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
