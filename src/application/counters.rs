//! Cache-aside liker counters.
//!
//! The decision store stays authoritative; every cached value must be
//! re-derivable from it. Counter failures therefore never surface:
//! reads fall back to the store and writes are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::warn;

use crate::application::repos::{DecisionsRepo, RepoError};
use crate::domain::decisions::UserId;

#[derive(Debug, Error)]
pub enum CounterStoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value counter backend. Mutations must be atomic per key; a
/// networked cache plugs in here.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<i64>, CounterStoreError>;

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), CounterStoreError>;

    /// Atomic add applied only to a live key, returning the new value.
    /// A missing or expired key is left untouched and reported as
    /// `None`; the read path recomputes it from the decision store.
    async fn incr(&self, key: &str, delta: i64) -> Result<Option<i64>, CounterStoreError>;

    /// Refresh the TTL of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CounterStoreError>;
}

/// Advisory per-recipient like counter with a fixed TTL, refreshed on
/// every read or write touching the key.
#[derive(Clone)]
pub struct LikeCounter {
    store: Arc<dyn CounterStore>,
    ttl: Duration,
}

impl LikeCounter {
    pub fn new(store: Arc<dyn CounterStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key_for(recipient: UserId) -> String {
        format!("likes:count:{recipient}")
    }

    /// Cache-first count. A hit refreshes the TTL; a miss, a store
    /// error, or an unusable cached value falls back to the
    /// authoritative count and repopulates the cache.
    pub async fn get_or_compute(
        &self,
        recipient: UserId,
        repo: &dyn DecisionsRepo,
    ) -> Result<u64, RepoError> {
        let key = Self::key_for(recipient);

        match self.store.get(&key).await {
            Ok(Some(cached)) if cached >= 0 => {
                counter!("smitten_like_count_cache_hit_total").increment(1);
                if let Err(err) = self.store.expire(&key, self.ttl).await {
                    warn!(
                        target: "smitten::counters",
                        recipient,
                        error = %err,
                        "failed to refresh counter ttl"
                    );
                }
                return Ok(cached as u64);
            }
            Ok(Some(drifted)) => {
                // Drift repair: a negative counter can only come from
                // misapplied adjustments, so recompute from the store.
                warn!(
                    target: "smitten::counters",
                    recipient,
                    value = drifted,
                    "cached like count went negative; recomputing"
                );
            }
            Ok(None) => {}
            Err(err) => {
                warn!(
                    target: "smitten::counters",
                    recipient,
                    error = %err,
                    "counter store read failed; falling back to database"
                );
            }
        }
        counter!("smitten_like_count_cache_miss_total").increment(1);

        let count = repo.count_likers(recipient).await?;
        let cached = i64::try_from(count).unwrap_or(i64::MAX);
        if let Err(err) = self.store.set(&key, cached, self.ttl).await {
            warn!(
                target: "smitten::counters",
                recipient,
                error = %err,
                "failed to repopulate counter cache"
            );
        }

        Ok(count)
    }

    /// Best-effort adjustment after a decision write. Never fails the
    /// caller: a successful store write must be acknowledged even when
    /// the advisory counter cannot keep up.
    pub async fn adjust(&self, recipient: UserId, delta: i64) {
        if delta == 0 {
            return;
        }
        let key = Self::key_for(recipient);

        match self.store.incr(&key, delta).await {
            // Cold key: leave it for the next read to recompute rather
            // than minting a counter that ignores pre-existing rows.
            Ok(None) => return,
            Ok(Some(_)) => {}
            Err(err) => {
                warn!(
                    target: "smitten::counters",
                    recipient,
                    delta,
                    error = %err,
                    "failed to adjust counter cache"
                );
                return;
            }
        }
        if let Err(err) = self.store.expire(&key, self.ttl).await {
            warn!(
                target: "smitten::counters",
                recipient,
                error = %err,
                "failed to refresh counter ttl"
            );
        }
    }
}

/// Counter delta implied by a decision write. Only actual state
/// transitions move the counter, so repeated identical decisions
/// cannot drift it.
pub fn adjustment_for(previous: Option<bool>, liked: bool) -> i64 {
    match (previous, liked) {
        (Some(true), false) => -1,
        (Some(true), true) => 0,
        (_, true) => 1,
        (_, false) => 0,
    }
}
