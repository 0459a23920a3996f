//! Decision ledger entities.

use time::OffsetDateTime;

/// Opaque identifier of a participant. Issued by the identity service
/// and never dereferenced here.
pub type UserId = u64;

/// Largest identifier the persistence layer can represent. Anything
/// above this is rejected as caller input before it reaches a query.
pub const MAX_USER_ID: UserId = i64::MAX as UserId;

/// One inbound like as returned by the liker queries. The ledger keeps
/// at most one decision per ordered (actor, recipient) pair; a later
/// decision overwrites `liked` in place, bumping `updated_at` and
/// preserving `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liker {
    pub actor_id: UserId,
    pub updated_at: OffsetDateTime,
}
