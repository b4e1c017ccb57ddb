// @awa-component: PRM-DecisionEngine
//
//! CRUD authorization over merged role permission sets.
//!
//! A request is allowed when any Api grant of any of the caller's roles
//! covers the request path and carries the flag for the action. Grants are
//! additive across roles and across overlapping menus.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::debug;

use super::cache::PermissionCache;
use super::path::ResourcePath;
use crate::auth::AuthError;
use crate::models::permission::{Action, MenuCategory, RoleMenuGrant};

/// Why an authenticated caller was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No grant path covers the request path.
    NoMatchingResource,
    /// Grants cover the path but none carries the action flag.
    InsufficientPermission(Action),
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::NoMatchingResource => f.write_str("no matching resource"),
            DenyReason::InsufficientPermission(action) => {
                write!(f, "insufficient permission for {action}")
            }
        }
    }
}

/// Authorization outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// `matched` is the longest allowing grant path, normalised.
    Allow { matched: String },
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }
}

/// Decide `action` on `request_path` against `grants`.
pub fn decide<'a>(
    grants: impl IntoIterator<Item = &'a RoleMenuGrant>,
    action: Action,
    request_path: &str,
) -> Decision {
    let request = ResourcePath::parse(request_path);
    let mut any_match = false;
    let mut best: Option<ResourcePath> = None;

    for grant in grants {
        let Some(raw) = grant.menu.path.as_deref().filter(|p| !p.trim().is_empty()) else {
            continue;
        };
        let prefix = ResourcePath::parse(raw);
        if !request.starts_with(&prefix) {
            continue;
        }
        any_match = true;
        if grant.allows(action) && best.as_ref().is_none_or(|b| prefix.depth() > b.depth()) {
            best = Some(prefix);
        }
    }

    match best {
        Some(matched) => Decision::Allow {
            matched: matched.to_string(),
        },
        None if any_match => Decision::Deny(DenyReason::InsufficientPermission(action)),
        None => Decision::Deny(DenyReason::NoMatchingResource),
    }
}

/// Resolves role permission sets through the cache and decides requests.
#[derive(Clone)]
pub struct AuthorizationEngine {
    cache: Arc<PermissionCache>,
}

impl AuthorizationEngine {
    pub fn new(cache: Arc<PermissionCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<PermissionCache> {
        &self.cache
    }

    /// Decide `action` on `request_path` for a caller holding `role_ids`.
    pub async fn authorize(
        &self,
        role_ids: &[i64],
        action: Action,
        request_path: &str,
    ) -> Result<Decision, AuthError> {
        let sets = self.resolve_all(role_ids, MenuCategory::Api).await?;
        let decision = decide(sets.iter().flat_map(|s| s.iter()), action, request_path);
        debug!(
            roles = ?role_ids,
            %action,
            path = request_path,
            ?decision,
            "Authorization decided"
        );
        Ok(decision)
    }

    /// Merged Page-category grants of every role, in role order.
    pub async fn page_permissions(&self, role_ids: &[i64]) -> Result<Vec<RoleMenuGrant>, AuthError> {
        let sets = self.resolve_all(role_ids, MenuCategory::Page).await?;
        Ok(sets.iter().flat_map(|s| s.iter().cloned()).collect())
    }

    async fn resolve_all(
        &self,
        role_ids: &[i64],
        category: MenuCategory,
    ) -> Result<Vec<super::PermissionSet>, AuthError> {
        try_join_all(role_ids.iter().map(|id| self.cache.resolve(*id, category))).await
    }
}
