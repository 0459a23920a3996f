//! Wire types for the decision API.
//!
//! User identifiers travel as decimal strings so clients never lose
//! precision on 64-bit values; timestamps are millisecond Unix values.

use serde::{Deserialize, Serialize};

use crate::application::pagination::{CursorPage, unix_millis};
use crate::domain::decisions::{Liker, UserId};

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PutDecisionRequest {
    pub actor_id: String,
    pub recipient_id: String,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct PutDecisionResponse {
    pub mutual: bool,
}

#[derive(Debug, Deserialize)]
pub struct LikerListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LikerDto {
    pub actor_id: String,
    pub unix_timestamp: u64,
}

impl From<Liker> for LikerDto {
    fn from(liker: Liker) -> Self {
        Self {
            actor_id: liker.actor_id.to_string(),
            unix_timestamp: unix_millis(liker.updated_at).max(0) as u64,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikerListResponse {
    pub likers: Vec<LikerDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl LikerListResponse {
    pub fn from_page(page: CursorPage<Liker>) -> Self {
        Self {
            likers: page.items.into_iter().map(LikerDto::from).collect(),
            next_cursor: page.next_cursor,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

pub fn parse_user_id(value: &str, field: &'static str) -> Result<UserId, ApiError> {
    value.trim().parse::<UserId>().map_err(|_| {
        ApiError::bad_request(
            "Request could not be processed",
            Some(format!("{field} must be a decimal unsigned integer")),
        )
    })
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn user_ids_parse_from_decimal_strings() {
        assert_eq!(parse_user_id("42", "actor_id").expect("parsed id"), 42);
        assert_eq!(parse_user_id(" 7 ", "actor_id").expect("parsed id"), 7);
        assert!(parse_user_id("-1", "actor_id").is_err());
        assert!(parse_user_id("abc", "actor_id").is_err());
        assert!(parse_user_id("", "actor_id").is_err());
    }

    #[test]
    fn liker_dto_carries_millisecond_timestamps() {
        let liker = Liker {
            actor_id: 42,
            updated_at: datetime!(2025-03-14 09:26:53.589 UTC),
        };
        let dto = LikerDto::from(liker);
        assert_eq!(dto.actor_id, "42");
        assert_eq!(dto.unix_timestamp, 1_741_944_413_589);
    }

    #[test]
    fn exhausted_pages_omit_the_next_cursor() {
        let response = LikerListResponse::from_page(CursorPage::new(Vec::new(), None));
        let body = serde_json::to_value(&response).expect("serialized response");
        assert!(body.get("next_cursor").is_none());
    }
}
