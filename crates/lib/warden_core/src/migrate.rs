//! Database migration support.
//!
//! Embeds the read-side schema (users, roles, menus, role/menu grants) that
//! the credential and permission queries run against.

use sqlx::PgPool;

/// Run all embedded migrations from `warden_core/migrations/`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
