//! Decision API handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;

use super::HttpState;
use super::error::ApiError;
use super::models::{
    CountResponse, LikerListQuery, LikerListResponse, PutDecisionRequest, PutDecisionResponse,
    parse_user_id,
};

pub async fn put_decision(
    State(state): State<HttpState>,
    Json(payload): Json<PutDecisionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = parse_user_id(&payload.actor_id, "actor_id")?;
    let recipient = parse_user_id(&payload.recipient_id, "recipient_id")?;

    let mutual = state
        .decisions
        .put_decision(actor, recipient, payload.liked)
        .await?;

    Ok(Json(PutDecisionResponse { mutual }))
}

pub async fn list_likers(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Query(query): Query<LikerListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let recipient = parse_user_id(&id, "id")?;
    let page = state
        .decisions
        .list_likers(recipient, query.cursor.as_deref(), query.limit)
        .await?;
    Ok(Json(LikerListResponse::from_page(page)))
}

pub async fn list_new_likers(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Query(query): Query<LikerListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let recipient = parse_user_id(&id, "id")?;
    let page = state
        .decisions
        .list_new_likers(recipient, query.cursor.as_deref(), query.limit)
        .await?;
    Ok(Json(LikerListResponse::from_page(page)))
}

pub async fn count_likers(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let recipient = parse_user_id(&id, "id")?;
    let count = state.decisions.count_likers(recipient).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn health(State(state): State<HttpState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error("infra::db", StatusCode::SERVICE_UNAVAILABLE, &err)
                .attach(&mut response);
            response
        }
    }
}
