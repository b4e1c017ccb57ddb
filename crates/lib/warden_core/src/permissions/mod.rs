// @awa-component: PRM-PermissionResolution
//
//! Role/menu permission resolution and authorization decisions.
//!
//! Grants are read per (role, category) through a [`GrantSource`], cached by
//! [`cache::PermissionCache`] and evaluated against request paths by
//! [`engine::AuthorizationEngine`].

pub mod cache;
pub mod engine;
pub mod path;
pub mod queries;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::AuthError;
use crate::models::permission::{MenuCategory, RoleMenuGrant};

/// Snapshot of one role's active grants for one category.
pub type PermissionSet = Arc<Vec<RoleMenuGrant>>;

/// Read access to role/menu grants.
#[async_trait]
pub trait GrantSource: Send + Sync {
    /// Active grants of `role_id` joined to active menus of `category`.
    async fn active_grants(
        &self,
        role_id: i64,
        category: MenuCategory,
    ) -> Result<Vec<RoleMenuGrant>, AuthError>;

    /// Reachability check.
    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// In-memory grant table.
#[derive(Default)]
pub struct StaticGrants {
    grants: RwLock<Vec<RoleMenuGrant>>,
    queries: AtomicUsize,
}

impl StaticGrants {
    pub fn new(grants: Vec<RoleMenuGrant>) -> Self {
        Self {
            grants: RwLock::new(grants),
            queries: AtomicUsize::new(0),
        }
    }

    /// Insert or replace the grant for (role, menu).
    pub async fn upsert(&self, grant: RoleMenuGrant) {
        let mut grants = self.grants.write().await;
        grants.retain(|g| !(g.role_id == grant.role_id && g.menu_id == grant.menu_id));
        grants.push(grant);
    }

    /// Remove the grant for (role, menu).
    pub async fn remove(&self, role_id: i64, menu_id: i64) {
        self.grants
            .write()
            .await
            .retain(|g| !(g.role_id == role_id && g.menu_id == menu_id));
    }

    /// Number of `active_grants` calls served.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GrantSource for StaticGrants {
    async fn active_grants(
        &self,
        role_id: i64,
        category: MenuCategory,
    ) -> Result<Vec<RoleMenuGrant>, AuthError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|g| g.role_id == role_id && g.is_active && g.menu.category == category)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::permission::{Action, Menu, MenuCategory, RoleMenuGrant};

    /// Api grant on `path` for `role_id` carrying exactly `actions`.
    pub fn grant(role_id: i64, menu_id: i64, path: &str, actions: &[Action]) -> RoleMenuGrant {
        RoleMenuGrant {
            role_id,
            menu_id,
            can_create: actions.contains(&Action::Create),
            can_read: actions.contains(&Action::Read),
            can_update: actions.contains(&Action::Update),
            can_delete: actions.contains(&Action::Delete),
            is_active: true,
            menu: Menu {
                id: menu_id,
                name: format!("menu-{menu_id}"),
                path: Some(path.to_string()),
                category: MenuCategory::Api,
            },
        }
    }

    pub fn page(role_id: i64, menu_id: i64, path: &str) -> RoleMenuGrant {
        let mut g = grant(role_id, menu_id, path, &[Action::Read]);
        g.menu.category = MenuCategory::Page;
        g
    }
}
