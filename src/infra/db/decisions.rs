//! Decision ledger queries.
//!
//! All liker listings share one condition set: decisions into the
//! recipient with `liked` set, minus actors the recipient has passed.
//! The new-likers variant additionally drops mutual pairs. Ordering is
//! always `(updated_at DESC, actor_id DESC)` so cursors resume exactly.

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder, query_as, query_scalar};
use time::OffsetDateTime;

use crate::application::pagination::{CursorPage, DecisionCursor, PageRequest};
use crate::application::repos::{DecisionsRepo, RepoError, UpsertOutcome};
use crate::domain::decisions::{Liker, UserId};

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const UPSERT_DECISION_SQL: &str = "\
WITH previous AS (
    SELECT liked FROM decisions WHERE actor_id = $1 AND recipient_id = $2
)
INSERT INTO decisions (actor_id, recipient_id, liked)
VALUES ($1, $2, $3)
ON CONFLICT (actor_id, recipient_id)
DO UPDATE SET liked = EXCLUDED.liked, updated_at = now()
RETURNING (SELECT liked FROM previous) AS previous_liked, updated_at";

const DECISION_BETWEEN_SQL: &str = "\
SELECT liked FROM decisions WHERE actor_id = $1 AND recipient_id = $2";

#[derive(FromRow)]
struct UpsertRow {
    previous_liked: Option<bool>,
    updated_at: OffsetDateTime,
}

#[derive(FromRow)]
struct LikerRow {
    actor_id: i64,
    updated_at: OffsetDateTime,
}

#[async_trait]
impl DecisionsRepo for PostgresRepositories {
    async fn upsert_decision(
        &self,
        actor: UserId,
        recipient: UserId,
        liked: bool,
    ) -> Result<UpsertOutcome, RepoError> {
        let row: UpsertRow = query_as(UPSERT_DECISION_SQL)
            .bind(db_id(actor)?)
            .bind(db_id(recipient)?)
            .bind(liked)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(UpsertOutcome {
            previous: row.previous_liked,
            updated_at: row.updated_at,
        })
    }

    async fn decision_between(
        &self,
        actor: UserId,
        recipient: UserId,
    ) -> Result<Option<bool>, RepoError> {
        query_scalar(DECISION_BETWEEN_SQL)
            .bind(db_id(actor)?)
            .bind(db_id(recipient)?)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn count_likers(&self, recipient: UserId) -> Result<u64, RepoError> {
        let recipient = db_id(recipient)?;
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM decisions d WHERE 1=1");
        apply_liker_conditions(&mut qb, recipient);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        convert_count(count)
    }

    async fn list_likers(
        &self,
        recipient: UserId,
        page: PageRequest,
    ) -> Result<CursorPage<Liker>, RepoError> {
        self.fetch_likers(recipient, page, false).await
    }

    async fn list_new_likers(
        &self,
        recipient: UserId,
        page: PageRequest,
    ) -> Result<CursorPage<Liker>, RepoError> {
        self.fetch_likers(recipient, page, true).await
    }
}

impl PostgresRepositories {
    async fn fetch_likers(
        &self,
        recipient: UserId,
        page: PageRequest,
        new_only: bool,
    ) -> Result<CursorPage<Liker>, RepoError> {
        let recipient = db_id(recipient)?;
        let mut qb =
            QueryBuilder::new("SELECT d.actor_id, d.updated_at FROM decisions d WHERE 1=1");
        apply_liker_conditions(&mut qb, recipient);
        if new_only {
            apply_mutual_exclusion(&mut qb, recipient);
        }
        if let Some(cursor) = page.cursor {
            // Row-value comparison resumes exactly after the cursor
            // position under the (updated_at, actor_id) sort.
            qb.push(" AND (d.updated_at, d.actor_id) < (");
            qb.push_bind(cursor.updated_at());
            qb.push(", ");
            qb.push_bind(db_id(cursor.actor_id())?);
            qb.push(")");
        }
        qb.push(" ORDER BY d.updated_at DESC, d.actor_id DESC LIMIT ");
        // Fetch one extra row to learn whether another page exists.
        qb.push_bind(i64::from(page.limit) + 1);

        let rows: Vec<LikerRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut likers = rows
            .into_iter()
            .map(|row| {
                let actor_id = u64::try_from(row.actor_id)
                    .map_err(|_| RepoError::from_persistence("negative actor id in decisions"))?;
                Ok(Liker {
                    actor_id,
                    updated_at: row.updated_at,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        let mut next_cursor = None;
        if likers.len() > page.limit as usize {
            likers.truncate(page.limit as usize);
            if let Some(last) = likers.last() {
                next_cursor = Some(DecisionCursor::new(last.actor_id, last.updated_at).encode());
            }
        }

        Ok(CursorPage::new(likers, next_cursor))
    }
}

fn apply_liker_conditions(qb: &mut QueryBuilder<'_, Postgres>, recipient: i64) {
    qb.push(" AND d.recipient_id = ");
    qb.push_bind(recipient);
    qb.push(" AND d.liked");
    qb.push(" AND NOT EXISTS (SELECT 1 FROM decisions p WHERE p.actor_id = ");
    qb.push_bind(recipient);
    qb.push(" AND p.recipient_id = d.actor_id AND NOT p.liked)");
}

fn apply_mutual_exclusion(qb: &mut QueryBuilder<'_, Postgres>, recipient: i64) {
    qb.push(" AND NOT EXISTS (SELECT 1 FROM decisions m WHERE m.actor_id = ");
    qb.push_bind(recipient);
    qb.push(" AND m.recipient_id = d.actor_id AND m.liked)");
}

fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}

fn db_id(id: UserId) -> Result<i64, RepoError> {
    i64::try_from(id).map_err(|_| RepoError::from_persistence("user id exceeds supported range"))
}
