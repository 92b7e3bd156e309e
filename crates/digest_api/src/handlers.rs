//! HTTP handlers for the read-only digest API.

use crate::query::{DigestFilter, DigestQuery, Page};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use common::DigestRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;

pub const DEFAULT_PAGE_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub query: Arc<DigestQuery>,
}

impl AppState {
    pub fn new(query: DigestQuery) -> Self {
        Self {
            query: Arc::new(query),
        }
    }
}

/// Query string of `GET /api/digests`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub date: Option<String>,
    pub source: Option<String>,
    pub tag: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<task::JoinError> for AppError {
    fn from(e: task::JoinError) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// GET /api/digests - filtered, paginated records
async fn list_digests(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page>, AppError> {
    let Query(params) = params?;
    if params.limit == 0 {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }

    let filter = DigestFilter {
        date: params.date,
        source: params.source,
        tag: params.tag,
    };
    let (offset, limit) = (params.offset, params.limit);
    let query = state.query.clone();
    let page = task::spawn_blocking(move || query.list(&filter, offset, limit)).await?;
    Ok(Json(page))
}

/// GET /api/latest - zero or one record
async fn latest_digest(State(state): State<AppState>) -> Result<Json<Vec<DigestRecord>>, AppError> {
    let query = state.query.clone();
    let latest = task::spawn_blocking(move || query.latest()).await?;
    Ok(Json(latest.into_iter().collect()))
}

/// GET /api/tags
async fn all_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let query = state.query.clone();
    Ok(Json(task::spawn_blocking(move || query.tags()).await?))
}

/// GET /api/sources
async fn all_sources(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let query = state.query.clone();
    Ok(Json(task::spawn_blocking(move || query.sources()).await?))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/digests", get(list_digests))
        .route("/api/latest", get(latest_digest))
        .route("/api/tags", get(all_tags))
        .route("/api/sources", get(all_sources))
        .route("/health", get(health_check))
        .with_state(state)
}
