//! Grant queries against `role_menus` joined to `menus`.

use async_trait::async_trait;
use sqlx::PgPool;

use super::GrantSource;
use crate::auth::AuthError;
use crate::models::permission::{Menu, MenuCategory, RoleMenuGrant};

type GrantRow = (
    i64,
    i64,
    bool,
    bool,
    bool,
    bool,
    bool,
    String,
    Option<String>,
    String,
);

/// Active grants for `role_id` on active menus of `category`, in menu order.
pub async fn find_active_grants(
    pool: &PgPool,
    role_id: i64,
    category: MenuCategory,
) -> Result<Vec<RoleMenuGrant>, AuthError> {
    let rows = sqlx::query_as::<_, GrantRow>(
        "SELECT rm.role_id, rm.menu_id, rm.is_create, rm.is_read, rm.is_update, rm.is_delete, \
                rm.is_active, m.name, m.path, m.category \
         FROM role_menus rm \
         JOIN menus m ON m.id = rm.menu_id \
         WHERE rm.role_id = $1 AND rm.is_active AND m.is_active AND m.category = $2 \
         ORDER BY m.sequence NULLS LAST, m.id",
    )
    .bind(role_id)
    .bind(category.as_str())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(
            |(role_id, menu_id, can_create, can_read, can_update, can_delete, is_active, name, path, category)| {
                let category = category.parse::<MenuCategory>().map_err(AuthError::Internal)?;
                Ok(RoleMenuGrant {
                    role_id,
                    menu_id,
                    can_create,
                    can_read,
                    can_update,
                    can_delete,
                    is_active,
                    menu: Menu {
                        id: menu_id,
                        name,
                        path,
                        category,
                    },
                })
            },
        )
        .collect()
}

/// Grant source over Postgres.
#[derive(Clone)]
pub struct PgGrantSource {
    pool: PgPool,
}

impl PgGrantSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantSource for PgGrantSource {
    async fn active_grants(
        &self,
        role_id: i64,
        category: MenuCategory,
    ) -> Result<Vec<RoleMenuGrant>, AuthError> {
        find_active_grants(&self.pool, role_id, category).await
    }

    async fn ping(&self) -> Result<(), AuthError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
