use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::checkin::{CheckInOutcome, CheckInStats};
use crate::models::{CheckIn, CheckInStatus, UserId};

#[derive(Debug, Deserialize)]
pub struct UserParams {
    pub user_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CheckInListResponse {
    pub check_ins: Vec<CheckIn>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub check_in: Option<CheckIn>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckInRequest {
    pub user_id: String,
    pub status: String,
}

fn require_user(user_id: Option<&str>) -> Result<UserId, ApiError> {
    match user_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(UserId::from(id)),
        _ => Err(ApiError::BadRequest("user_id is required".to_string())),
    }
}

pub async fn list_check_ins(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<CheckInListResponse>, ApiError> {
    let user_id = require_user(params.user_id.as_deref())?;
    let history = state.check_ins.history(&user_id)?;

    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, history.len() as u32);

    Ok(Json(CheckInListResponse {
        check_ins: pagination.slice(&history).to_vec(),
        pagination: meta,
    }))
}

pub async fn today_check_in(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<TodayResponse>, ApiError> {
    let user_id = require_user(params.user_id.as_deref())?;
    let date = Utc::now().date_naive();
    let check_in = state.check_ins.today(&user_id, date)?;
    Ok(Json(TodayResponse { date, check_in }))
}

pub async fn check_in_stats(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<CheckInStats>, ApiError> {
    let user_id = require_user(params.user_id.as_deref())?;
    let stats = state.check_ins.stats(&user_id, Utc::now().date_naive())?;
    Ok(Json(stats))
}

pub async fn create_check_in(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckInRequest>,
) -> Result<(StatusCode, Json<CheckInOutcome>), ApiError> {
    let user_id = require_user(Some(&request.user_id))?;
    let status: CheckInStatus = request.status.parse().map_err(ApiError::BadRequest)?;

    let outcome = state
        .check_ins
        .record(&user_id, Utc::now().date_naive(), status)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
