//! Credential queries against the `users` and `user_roles` tables.

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthError;
use super::credentials::CredentialStore;
use crate::models::auth::CredentialRecord;

type UserRow = (i64, String, String, String, String, String, String);

/// Fetch the active user row for `username` (case-insensitive).
pub async fn find_active_user(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRow>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, password_salt, first_name, last_name, email \
         FROM users WHERE lower(username) = lower($1) AND is_active",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Active role ids for a user, in role-id order.
pub async fn get_active_role_ids(pool: &PgPool, user_id: i64) -> Result<Vec<i64>, AuthError> {
    let rows = sqlx::query_scalar::<_, i64>(
        "SELECT ur.role_id FROM user_roles ur \
         JOIN roles r ON r.id = ur.role_id \
         WHERE ur.user_id = $1 AND ur.is_active AND r.is_active \
         ORDER BY ur.role_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Credential store over Postgres.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_active_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        let Some((id, username, hash, salt, first, last, email)) =
            find_active_user(&self.pool, username).await?
        else {
            return Ok(None);
        };
        let role_ids = get_active_role_ids(&self.pool, id).await?;
        Ok(Some(CredentialRecord {
            subject_id: id.to_string(),
            username,
            password_hash: hash,
            password_salt: salt,
            display_name: format!("{first} {last}").trim().to_string(),
            email,
            role_ids,
        }))
    }

    async fn ping(&self) -> Result<(), AuthError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
