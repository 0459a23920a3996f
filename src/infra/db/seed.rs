//! Deterministic demo data for local development.

use tracing::info;

use crate::application::repos::{DecisionsRepo, RepoError};

use super::PostgresRepositories;

const USERS: u64 = 20;
const DECISIONS_PER_ACTOR: u64 = 12;

/// Seed a small, reproducible decision graph: a spread of likes and
/// passes per user plus a handful of mutual pairs. Re-running is
/// idempotent since decisions upsert.
pub async fn seed_demo_data(repos: &PostgresRepositories) -> Result<(), RepoError> {
    let mut written = 0u64;

    for actor in 1..=USERS {
        for step in 0..DECISIONS_PER_ACTOR {
            let recipient = (actor + step * 3) % USERS + 1;
            if recipient == actor {
                continue;
            }
            let liked = (actor * 31 + step * 7) % 10 < 7;
            repos.upsert_decision(actor, recipient, liked).await?;
            written += 1;

            if liked && (actor + recipient) % 3 == 0 {
                repos.upsert_decision(recipient, actor, true).await?;
                written += 1;
            }
        }
    }

    info!(target: "smitten::seed", decisions = written, "seeded demo decisions");
    Ok(())
}
