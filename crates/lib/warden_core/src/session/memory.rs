//! In-process session store.
//!
//! Single-node development and tests only: records are not shared between
//! instances, so revocation does not propagate across a fleet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{SessionKey, SessionRecord, SessionStore};
use crate::auth::AuthError;

struct Entry {
    record: SessionRecord,
    expires_at: Instant,
}

/// DashMap-backed store with per-entry expiry.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included until cleanup.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict expired entries.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
    }

    /// Spawn a periodic cleanup task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                store.cleanup();
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(
        &self,
        key: &SessionKey,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                record: record.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>, AuthError> {
        let k = key.to_string();
        let live = match self.entries.get(&k) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.record.clone()),
            Some(_) => None,
            None => return Ok(None),
        };
        if live.is_none() {
            self.entries.remove(&k);
        }
        Ok(live)
    }

    async fn remove(&self, key: &SessionKey) -> Result<bool, AuthError> {
        Ok(self.entries.remove(&key.to_string()).is_some())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
