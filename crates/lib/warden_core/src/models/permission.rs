// @awa-component: PRM-Schema
//
//! Role/menu permission models.
//!
//! Types matching the `menus` and `role_menus` tables plus the CRUD action
//! vocabulary used by the decision engine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Menu category. Partitions permission sets by consumer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuCategory {
    /// Interactive pages rendered by the client.
    Page,
    /// Programmatic endpoints guarded per request.
    Api,
    /// Mobile client screens.
    Mobile,
}

impl MenuCategory {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCategory::Page => "Page",
            MenuCategory::Api => "Api",
            MenuCategory::Mobile => "Mobile",
        }
    }
}

impl std::fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Page" => Ok(MenuCategory::Page),
            "Api" => Ok(MenuCategory::Api),
            "Mobile" => Ok(MenuCategory::Mobile),
            other => Err(format!("unknown menu category '{other}'")),
        }
    }
}

/// CRUD operation kind requested by the resource service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Menu row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: i64,
    pub name: String,
    /// Resource path the menu guards. Menus without a path never match.
    pub path: Option<String>,
    pub category: MenuCategory,
}

/// Role/menu grant row joined to its menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMenuGrant {
    pub role_id: i64,
    pub menu_id: i64,
    pub can_create: bool,
    pub can_read: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub is_active: bool,
    pub menu: Menu,
}

impl RoleMenuGrant {
    /// Whether this grant carries the flag for `action`.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.can_create,
            Action::Read => self.can_read,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
        }
    }
}
