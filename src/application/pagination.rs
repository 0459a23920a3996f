//! Cursor pagination for inbound-like listings.
//!
//! The ordering key is `(updated_at DESC, actor_id DESC)`. `updated_at`
//! alone is not unique, so the actor id breaks ties and the sequence is
//! strictly and deterministically ordered even when several decisions
//! share a timestamp.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::decisions::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct DecisionCursorPayload {
    actor_id: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    updated_unix: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Resume position in a `(updated_at DESC, actor_id DESC)` ordered
/// sequence, carried over the wire as URL-safe base64 of a JSON
/// payload with a millisecond Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionCursor {
    actor_id: UserId,
    updated_at: OffsetDateTime,
}

impl DecisionCursor {
    /// Construct a cursor from the last returned row. The timestamp is
    /// truncated to millisecond precision to match the wire format.
    pub fn new(actor_id: UserId, updated_at: OffsetDateTime) -> Self {
        let truncated = from_unix_millis(unix_millis(updated_at)).unwrap_or(updated_at);
        Self {
            actor_id,
            updated_at: truncated,
        }
    }

    pub fn actor_id(&self) -> UserId {
        self.actor_id
    }

    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }

    /// A cursor that does not point past any row requests the first
    /// page. This mirrors the zero-value token callers may send.
    pub fn is_unset(&self) -> bool {
        self.actor_id == 0 || self.updated_at <= OffsetDateTime::UNIX_EPOCH
    }

    pub fn encode(&self) -> String {
        let payload = DecisionCursorPayload {
            actor_id: self.actor_id,
            updated_unix: unix_millis(self.updated_at),
        };
        let serialized = serde_json::to_vec(&payload)
            .expect("serializing decision cursor payload should succeed");
        URL_SAFE.encode(serialized)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: DecisionCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let updated_at = from_unix_millis(payload.updated_unix).map_err(|_| {
            PaginationError::InvalidCursor("cursor timestamp out of range".to_string())
        })?;
        Ok(Self {
            actor_id: payload.actor_id,
            updated_at,
        })
    }

    /// Turn an optional caller-supplied token into a resume position.
    /// An absent or empty token is a valid "start from the beginning"
    /// request, as is a decoded zero cursor.
    pub fn parse(token: Option<&str>) -> Result<Option<Self>, PaginationError> {
        let token = match token.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(None),
        };
        let cursor = Self::decode(token)?;
        Ok((!cursor.is_unset()).then_some(cursor))
    }
}

pub fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
}

/// Cursor-aware pagination request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub limit: u32,
    pub cursor: Option<DecisionCursor>,
}

/// Cursor-aware page result.
#[derive(Debug, Clone)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
