//! JSON API surface.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, put},
};

use crate::application::decisions::DecisionService;
use crate::infra::db::PostgresRepositories;
use crate::infra::http::middleware::log_responses;

#[derive(Clone)]
pub struct HttpState {
    pub decisions: Arc<DecisionService>,
    pub db: Arc<PostgresRepositories>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/v1/decisions", put(handlers::put_decision))
        .route("/api/v1/users/{id}/likers", get(handlers::list_likers))
        .route(
            "/api/v1/users/{id}/likers/new",
            get(handlers::list_new_likers),
        )
        .route(
            "/api/v1/users/{id}/likers/count",
            get(handlers::count_likers),
        )
        .route("/healthz", get(handlers::health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
}
