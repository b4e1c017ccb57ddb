//! Redis-backed session store, shared across instances.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use super::{SessionKey, SessionRecord, SessionStore};
use crate::auth::AuthError;

/// Session store on a Redis hash per key.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect to `url` with an auto-reconnecting connection manager.
    pub async fn connect(url: &str) -> Result<Self, AuthError> {
        let client = redis::Client::open(url)
            .map_err(|e| AuthError::Configuration(format!("REDIS_URL: {e}")))?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to session store");
        Ok(Self { conn })
    }

    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(
        &self,
        key: &SessionKey,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        if record.is_empty() {
            return Err(AuthError::Internal("refusing to store an empty session".into()));
        }
        let k = key.to_string();
        let items: Vec<(&String, &String)> = record.fields().iter().collect();
        let secs = ttl.as_secs().max(1) as i64;

        // DEL first so stale fields from an older claim layout never survive.
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .del(&k)
            .ignore()
            .hset_multiple(&k, &items)
            .ignore()
            .expire(&k, secs)
            .ignore()
            .query_async(&mut conn)
            .await?;
        debug!(key = %k, ttl_secs = secs, "Session stored");
        Ok(())
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>, AuthError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(key.to_string()).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(SessionRecord::from_fields(fields)))
    }

    async fn remove(&self, key: &SessionKey) -> Result<bool, AuthError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key.to_string()).await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::TokenKind;

    async fn store() -> Option<RedisSessionStore> {
        let url = std::env::var("REDIS_URL").ok()?;
        Some(RedisSessionStore::connect(&url).await.expect("connect to REDIS_URL"))
    }

    fn record(sid: &str, name: &str) -> SessionRecord {
        SessionRecord::from_fields(HashMap::from([
            ("sid".to_string(), format!("\"{sid}\"")),
            ("name".to_string(), format!("\"{name}\"")),
        ]))
    }

    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn hash_round_trip_with_expiry() {
        let Some(store) = store().await else {
            return;
        };
        let key = SessionKey::new("redis-test", TokenKind::Access, "round-trip");
        store.put(&key, &record("a", "Ada"), Duration::from_secs(60)).await.unwrap();

        let mut conn = store.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(key.to_string()).await.unwrap();
        assert_eq!(raw.get("sid").map(String::as_str), Some("\"a\""));
        assert_eq!(raw.get("name").map(String::as_str), Some("\"Ada\""));
        let ttl: i64 = conn.ttl(key.to_string()).await.unwrap();
        assert!((1..=60).contains(&ttl), "ttl {ttl}");

        let got = store.get(&key).await.unwrap().unwrap();
        assert_eq!(got.session_id().as_deref(), Some("a"));

        assert!(store.remove(&key).await.unwrap());
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn put_drops_fields_of_previous_record() {
        let Some(store) = store().await else {
            return;
        };
        let key = SessionKey::new("redis-test", TokenKind::Refresh, "overwrite");
        store.put(&key, &record("a", "Ada"), Duration::from_secs(60)).await.unwrap();
        let newer = SessionRecord::from_fields(HashMap::from([(
            "sid".to_string(),
            "\"b\"".to_string(),
        )]));
        store.put(&key, &newer, Duration::from_secs(60)).await.unwrap();

        let got = store.get(&key).await.unwrap().unwrap();
        assert_eq!(got.session_id().as_deref(), Some("b"));
        assert!(!got.fields().contains_key("name"));
        store.remove(&key).await.unwrap();
        store.ping().await.unwrap();
    }
}
