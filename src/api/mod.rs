//! REST API endpoints.
//!
//! Axum-based HTTP API over the check-in workflow and the scoring engine.
//! Handlers load records through the repository, hand them to
//! [`crate::calculate`] and serialize the result.

pub mod cache;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::calculate::CalculateError;
use crate::checkin::CheckInError;
use crate::standings::StandingsError;
use crate::storage::StorageError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Server-side goal configuration that cannot be scored.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<CalculateError> for ApiError {
    fn from(e: CalculateError) -> Self {
        match e {
            CalculateError::InvalidGoal(msg) => ApiError::Configuration(msg),
            CalculateError::UnknownMetric(_) | CalculateError::UnknownWindow(_) => {
                ApiError::BadRequest(e.to_string())
            }
        }
    }
}

impl From<CheckInError> for ApiError {
    fn from(e: CheckInError) -> Self {
        match e {
            CheckInError::Backdated { .. } => ApiError::BadRequest(e.to_string()),
            CheckInError::Storage(e) => e.into(),
        }
    }
}

impl From<StandingsError> for ApiError {
    fn from(e: StandingsError) -> Self {
        match e {
            StandingsError::NotFound(what) => ApiError::NotFound(what),
            StandingsError::Storage(e) => e.into(),
            StandingsError::Calculate(e) => e.into(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Pagination parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(50).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }

    /// The slice of `items` on this page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.offset() as usize).min(items.len());
        let end = (start + self.page_size as usize).min(items.len());
        &items[start..end]
    }
}

/// Pagination metadata in responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u32) -> Self {
        let total_pages = total_items.div_ceil(pagination.page_size);
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

/// Assemble all routes with request tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/checkins",
            get(routes::checkins::list_check_ins).post(routes::checkins::create_check_in),
        )
        .route("/api/checkins/today", get(routes::checkins::today_check_in))
        .route("/api/checkins/stats", get(routes::checkins::check_in_stats))
        .route("/api/activities", post(routes::activities::log_activity))
        .route(
            "/api/groups/:id/leaderboard",
            get(routes::leaderboard::group_leaderboard),
        )
        .route(
            "/api/leaderboard/challenge/:id",
            get(routes::leaderboard::challenge_leaderboard),
        )
        .route(
            "/api/leaderboard/league/:id",
            get(routes::leaderboard::league_leaderboard),
        )
        .route(
            "/api/challenges/:id/weeks/:week/scores",
            post(routes::scores::generate_week_scores),
        )
        .route(
            "/api/macros/challenge/:id/week/:week/user/:user_id",
            get(routes::macros::challenge_week_macros),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origin; `*` allows any origin.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}
