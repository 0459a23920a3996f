//! In-memory decision store mirroring the Postgres query semantics,
//! used to exercise the service layer without a database.

// Not every test binary touches every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use smitten::application::counters::LikeCounter;
use smitten::application::decisions::DecisionService;
use smitten::application::pagination::{CursorPage, DecisionCursor, PageRequest};
use smitten::application::repos::{DecisionsRepo, RepoError, UpsertOutcome};
use smitten::domain::decisions::{Liker, UserId};
use smitten::infra::cache::MemoryCounterStore;

const CLOCK_EPOCH_MS: i64 = 1_700_000_000_000;

#[derive(Debug, Clone, Copy)]
struct StoredDecision {
    liked: bool,
    updated_at: OffsetDateTime,
}

#[derive(Debug)]
struct State {
    decisions: HashMap<(UserId, UserId), StoredDecision>,
    now_ms: i64,
}

/// Decision ledger backed by a map with a deterministic millisecond
/// clock: every write lands one tick after the previous one.
#[derive(Debug)]
pub struct InMemoryDecisions {
    state: Mutex<State>,
}

impl Default for InMemoryDecisions {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                decisions: HashMap::new(),
                now_ms: CLOCK_EPOCH_MS,
            }),
        }
    }
}

impl InMemoryDecisions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decision(&self, actor: UserId, recipient: UserId) -> Option<bool> {
        let state = self.state.lock().expect("decision store lock");
        state
            .decisions
            .get(&(actor, recipient))
            .map(|decision| decision.liked)
    }

    pub fn len(&self) -> usize {
        let state = self.state.lock().expect("decision store lock");
        state.decisions.len()
    }

    /// Insert a decision at an explicit timestamp, bypassing the
    /// internal clock. Used to construct timestamp ties.
    pub fn insert_raw(&self, actor: UserId, recipient: UserId, liked: bool, at: OffsetDateTime) {
        let mut state = self.state.lock().expect("decision store lock");
        state.decisions.insert(
            (actor, recipient),
            StoredDecision {
                liked,
                updated_at: at,
            },
        );
    }

    fn eligible_likers(&self, recipient: UserId, exclude_mutual: bool) -> Vec<Liker> {
        let state = self.state.lock().expect("decision store lock");
        let mut likers: Vec<Liker> = state
            .decisions
            .iter()
            .filter(|((_, target), decision)| *target == recipient && decision.liked)
            .map(|((actor, _), decision)| Liker {
                actor_id: *actor,
                updated_at: decision.updated_at,
            })
            .filter(|liker| {
                let back = state.decisions.get(&(recipient, liker.actor_id));
                let passed = back.is_some_and(|decision| !decision.liked);
                let liked_back = back.is_some_and(|decision| decision.liked);
                !passed && !(exclude_mutual && liked_back)
            })
            .collect();
        likers.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(b.actor_id.cmp(&a.actor_id))
        });
        likers
    }

    fn paginate(mut likers: Vec<Liker>, page: PageRequest) -> CursorPage<Liker> {
        if let Some(cursor) = page.cursor {
            likers.retain(|liker| {
                (liker.updated_at, liker.actor_id) < (cursor.updated_at(), cursor.actor_id())
            });
        }
        let limit = page.limit as usize;
        let mut next_cursor = None;
        if likers.len() > limit {
            likers.truncate(limit);
            if let Some(last) = likers.last() {
                next_cursor = Some(DecisionCursor::new(last.actor_id, last.updated_at).encode());
            }
        }
        CursorPage::new(likers, next_cursor)
    }
}

#[async_trait]
impl DecisionsRepo for InMemoryDecisions {
    async fn upsert_decision(
        &self,
        actor: UserId,
        recipient: UserId,
        liked: bool,
    ) -> Result<UpsertOutcome, RepoError> {
        let mut state = self.state.lock().expect("decision store lock");
        state.now_ms += 1;
        let updated_at = OffsetDateTime::from_unix_timestamp_nanos(
            i128::from(state.now_ms) * 1_000_000,
        )
        .expect("clock timestamp in range");

        let previous = state
            .decisions
            .insert((actor, recipient), StoredDecision { liked, updated_at })
            .map(|decision| decision.liked);

        Ok(UpsertOutcome {
            previous,
            updated_at,
        })
    }

    async fn decision_between(
        &self,
        actor: UserId,
        recipient: UserId,
    ) -> Result<Option<bool>, RepoError> {
        let state = self.state.lock().expect("decision store lock");
        Ok(state
            .decisions
            .get(&(actor, recipient))
            .map(|decision| decision.liked))
    }

    async fn count_likers(&self, recipient: UserId) -> Result<u64, RepoError> {
        Ok(self.eligible_likers(recipient, false).len() as u64)
    }

    async fn list_likers(
        &self,
        recipient: UserId,
        page: PageRequest,
    ) -> Result<CursorPage<Liker>, RepoError> {
        Ok(Self::paginate(self.eligible_likers(recipient, false), page))
    }

    async fn list_new_likers(
        &self,
        recipient: UserId,
        page: PageRequest,
    ) -> Result<CursorPage<Liker>, RepoError> {
        Ok(Self::paginate(self.eligible_likers(recipient, true), page))
    }
}

pub fn new_service(repo: &Arc<InMemoryDecisions>) -> DecisionService {
    let store: Arc<dyn DecisionsRepo> = repo.clone();
    let counters = LikeCounter::new(
        Arc::new(MemoryCounterStore::new()),
        Duration::from_secs(3_600),
    );
    DecisionService::new(store, counters, 20, 100)
}
