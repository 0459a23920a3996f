use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::decisions::DecisionError;
use crate::application::error::ErrorReport;
use crate::application::pagination::PaginationError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

pub mod codes {
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INVALID_CURSOR: &str = "invalid_cursor";
    pub const NOT_FOUND: &str = "not_found";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const CANCELED: &str = "canceled";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_INPUT, message, hint)
    }

    pub fn invalid_cursor(hint: Option<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_CURSOR,
            "Cursor could not be decoded",
            hint,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn db_timeout() -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            codes::DB_TIMEOUT,
            "Database query timed out",
            None,
        )
    }

    pub fn canceled() -> Self {
        // 499 Client Closed Request; not a named StatusCode constant.
        Self::new(
            StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            codes::CANCELED,
            "Request was canceled",
            None,
        )
    }

    pub fn internal(hint: Option<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Unexpected error occurred",
            hint,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so the logging middleware can emit
        // rich diagnostics without leaking them to clients.
        ErrorReport::from_message(
            "infra::http",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

impl From<DecisionError> for ApiError {
    fn from(error: DecisionError) -> Self {
        match error {
            DecisionError::Domain(DomainError::Validation { message }) => {
                ApiError::bad_request("Request could not be processed", Some(message))
            }
            DecisionError::Repo(RepoError::Pagination(PaginationError::InvalidCursor(detail))) => {
                ApiError::invalid_cursor(Some(detail))
            }
            DecisionError::Repo(RepoError::NotFound) => ApiError::not_found("Resource not found"),
            DecisionError::Repo(RepoError::Timeout) => ApiError::db_timeout(),
            DecisionError::Repo(RepoError::Canceled) => ApiError::canceled(),
            DecisionError::Repo(RepoError::Persistence(detail)) => {
                ApiError::internal(Some(detail))
            }
        }
    }
}
