//! Decision write and liker query orchestration.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::debug;

use crate::application::counters::{LikeCounter, adjustment_for};
use crate::application::pagination::{CursorPage, DecisionCursor, PageRequest};
use crate::application::repos::{DecisionsRepo, RepoError};
use crate::domain::decisions::{Liker, MAX_USER_ID, UserId};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Application facade over the decision ledger: records decisions,
/// answers the three liker queries, and keeps the advisory counter in
/// step with actual state transitions.
pub struct DecisionService {
    repo: Arc<dyn DecisionsRepo>,
    counters: LikeCounter,
    default_page_size: u32,
    max_page_size: u32,
}

impl DecisionService {
    pub fn new(
        repo: Arc<dyn DecisionsRepo>,
        counters: LikeCounter,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Self {
        Self {
            repo,
            counters,
            default_page_size,
            max_page_size,
        }
    }

    /// Record or overwrite a decision and report whether it completed a
    /// mutual like. A pass always reports `false`.
    pub async fn put_decision(
        &self,
        actor: UserId,
        recipient: UserId,
        liked: bool,
    ) -> Result<bool, DecisionError> {
        if actor == recipient {
            return Err(DomainError::validation("actor cannot decide on themselves").into());
        }
        check_user_id(actor, "actor_id")?;
        check_user_id(recipient, "recipient_id")?;

        let outcome = self.repo.upsert_decision(actor, recipient, liked).await?;
        counter!("smitten_decisions_written_total").increment(1);
        debug!(
            target: "smitten::decisions",
            actor,
            recipient,
            liked,
            previous = ?outcome.previous,
            "decision recorded"
        );

        // A repeated pass changes neither counter nor mutuality, so the
        // reverse decision is only fetched when something can transition.
        let repeat_pass = !liked && outcome.previous == Some(false);
        let reverse = if repeat_pass {
            None
        } else {
            self.repo.decision_between(recipient, actor).await?
        };

        // The recipient's counter only tracks likers the recipient has
        // not passed; a like from a passed actor is invisible to it.
        if reverse != Some(false) {
            self.counters
                .adjust(recipient, adjustment_for(outcome.previous, liked))
                .await;
        }

        // Passing (or un-passing) someone who likes the actor moves the
        // actor's own count, since passes exclude that liker.
        if reverse == Some(true) {
            let was_excluded = outcome.previous == Some(false);
            let delta = match (was_excluded, !liked) {
                (true, false) => 1,
                (false, true) => -1,
                _ => 0,
            };
            self.counters.adjust(actor, delta).await;
        }

        Ok(liked && reverse == Some(true))
    }

    /// Everyone who currently likes `recipient`, newest decision first.
    pub async fn list_likers(
        &self,
        recipient: UserId,
        token: Option<&str>,
        limit: Option<i64>,
    ) -> Result<CursorPage<Liker>, DecisionError> {
        check_user_id(recipient, "recipient_id")?;
        let page = self.page_request(token, limit)?;
        Ok(self.repo.list_likers(recipient, page).await?)
    }

    /// Likers the recipient has not liked back yet.
    pub async fn list_new_likers(
        &self,
        recipient: UserId,
        token: Option<&str>,
        limit: Option<i64>,
    ) -> Result<CursorPage<Liker>, DecisionError> {
        check_user_id(recipient, "recipient_id")?;
        let page = self.page_request(token, limit)?;
        Ok(self.repo.list_new_likers(recipient, page).await?)
    }

    /// Current liker count, served cache-first.
    pub async fn count_likers(&self, recipient: UserId) -> Result<u64, DecisionError> {
        check_user_id(recipient, "recipient_id")?;
        let count = self
            .counters
            .get_or_compute(recipient, self.repo.as_ref())
            .await?;
        Ok(count)
    }

    fn page_request(
        &self,
        token: Option<&str>,
        limit: Option<i64>,
    ) -> Result<PageRequest, DecisionError> {
        let limit = match limit {
            None => self.default_page_size,
            Some(requested) if requested <= 0 => {
                return Err(
                    DomainError::validation("limit must be a positive integer").into(),
                );
            }
            Some(requested) => {
                u32::try_from(requested).unwrap_or(u32::MAX).min(self.max_page_size)
            }
        };
        let cursor = DecisionCursor::parse(token).map_err(RepoError::from)?;
        Ok(PageRequest { limit, cursor })
    }
}

fn check_user_id(id: UserId, field: &str) -> Result<(), DomainError> {
    if id == 0 || id > MAX_USER_ID {
        return Err(DomainError::validation(format!(
            "{field} must be between 1 and {MAX_USER_ID}"
        )));
    }
    Ok(())
}
