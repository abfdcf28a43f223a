use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::ScoreEntry;
use crate::standings;

#[derive(Debug, Serialize)]
pub struct WeekScoresResponse {
    pub challenge_id: String,
    pub week: u32,
    pub scores: Vec<ScoreEntry>,
}

/// Score every participant for the week and persist the entries.
pub async fn generate_week_scores(
    State(state): State<AppState>,
    Path((id, week)): Path<(String, u32)>,
) -> Result<(StatusCode, Json<WeekScoresResponse>), ApiError> {
    if week == 0 {
        return Err(ApiError::BadRequest("week is 1-based".to_string()));
    }

    let scores =
        standings::generate_week_scores(state.repository.as_ref(), &id.as_str().into(), week)?;

    Ok((
        StatusCode::CREATED,
        Json(WeekScoresResponse {
            challenge_id: id,
            week,
            scores,
        }),
    ))
}
