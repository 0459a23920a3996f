//! In-process counter store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::counters::{CounterStore, CounterStoreError};

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    value: i64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local [`CounterStore`] with per-key TTLs. Expired entries
/// are reaped lazily on access; an increment that finds an expired or
/// missing entry reports it cold instead of inventing a fresh counter.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    entries: Arc<RwLock<HashMap<String, CounterEntry>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, CounterStoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), CounterStoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CounterEntry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<Option<i64>, CounterStoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.value = entry.value.saturating_add(delta);
                Ok(Some(entry.value))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CounterStoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let expired = entries.get(key).is_some_and(|entry| entry.is_expired(now));
        if expired {
            entries.remove(key);
            return Ok(());
        }
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(now + ttl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryCounterStore::new();
        store
            .set("likes:count:1", 4, Duration::from_secs(60))
            .await
            .expect("set");
        assert_eq!(store.get("likes:count:1").await.expect("get"), Some(4));
    }

    #[tokio::test]
    async fn zero_ttl_entries_are_already_expired() {
        let store = MemoryCounterStore::new();
        store
            .set("likes:count:1", 4, Duration::ZERO)
            .await
            .expect("set");
        assert_eq!(store.get("likes:count:1").await.expect("get"), None);
    }

    #[tokio::test]
    async fn incr_adjusts_live_entries() {
        let store = MemoryCounterStore::new();
        store
            .set("likes:count:1", 4, Duration::from_secs(60))
            .await
            .expect("set");
        let value = store.incr("likes:count:1", 3).await.expect("incr");
        assert_eq!(value, Some(7));
        assert_eq!(store.get("likes:count:1").await.expect("get"), Some(7));
    }

    #[tokio::test]
    async fn incr_reports_missing_and_expired_entries_as_cold() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.incr("likes:count:1", 3).await.expect("incr"), None);

        store
            .set("likes:count:1", 10, Duration::ZERO)
            .await
            .expect("set");
        assert_eq!(store.incr("likes:count:1", 1).await.expect("incr"), None);
        assert_eq!(store.get("likes:count:1").await.expect("get"), None);
    }

    #[tokio::test]
    async fn expire_drops_already_expired_entries() {
        let store = MemoryCounterStore::new();
        store
            .set("likes:count:1", 10, Duration::ZERO)
            .await
            .expect("set");
        store
            .expire("likes:count:1", Duration::from_secs(60))
            .await
            .expect("expire");
        assert_eq!(store.get("likes:count:1").await.expect("get"), None);
    }

    #[tokio::test]
    async fn expire_refreshes_live_entries() {
        let store = MemoryCounterStore::new();
        store
            .set("likes:count:1", 10, Duration::from_secs(60))
            .await
            .expect("set");
        store
            .expire("likes:count:1", Duration::from_secs(120))
            .await
            .expect("expire");
        assert_eq!(store.get("likes:count:1").await.expect("get"), Some(10));
    }
}
