//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::{CursorPage, PageRequest, PaginationError};
use crate::domain::decisions::{Liker, UserId};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("database timeout")]
    Timeout,
    #[error("request canceled")]
    Canceled,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Result of a decision upsert. `previous` is `None` on the first
/// decision for the pair, otherwise the `liked` value it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub previous: Option<bool>,
    pub updated_at: OffsetDateTime,
}

/// Durable (actor, recipient) → liked ledger.
///
/// `upsert_decision` must be atomic per pair: concurrent writes to the
/// same pair serialize to one consistent final row, never duplicates.
/// Identifiers are bounded by [`crate::domain::decisions::MAX_USER_ID`].
#[async_trait]
pub trait DecisionsRepo: Send + Sync {
    async fn upsert_decision(
        &self,
        actor: UserId,
        recipient: UserId,
        liked: bool,
    ) -> Result<UpsertOutcome, RepoError>;

    /// The decision `actor` currently holds about `recipient`, if any.
    /// Used for mutuality detection and counter bookkeeping.
    async fn decision_between(
        &self,
        actor: UserId,
        recipient: UserId,
    ) -> Result<Option<bool>, RepoError>;

    async fn has_liked(&self, actor: UserId, recipient: UserId) -> Result<bool, RepoError> {
        Ok(self.decision_between(actor, recipient).await? == Some(true))
    }

    /// Authoritative liker count: distinct actors with a like into
    /// `recipient`, minus anyone the recipient has passed.
    async fn count_likers(&self, recipient: UserId) -> Result<u64, RepoError>;

    async fn list_likers(
        &self,
        recipient: UserId,
        page: PageRequest,
    ) -> Result<CursorPage<Liker>, RepoError>;

    /// Like `list_likers`, additionally excluding mutual pairs.
    async fn list_new_likers(
        &self,
        recipient: UserId,
        page: PageRequest,
    ) -> Result<CursorPage<Liker>, RepoError>;
}
