use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::parse_metric;
use crate::models::{ActivityKind, ActivityRecord, Metric, UserId};

#[derive(Debug, Deserialize)]
pub struct LogActivityRequest {
    pub user_id: String,
    pub kind: ActivityKind,
    /// Defaults to the time of the request
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metric_values: BTreeMap<String, f64>,
}

/// Check metric names and values before anything is stored.
fn validate_metric_values(values: &BTreeMap<String, f64>) -> Result<(), ApiError> {
    for (name, value) in values {
        // counted from the record kind, never submitted
        if parse_metric(name)? == Metric::WorkoutCount {
            return Err(ApiError::BadRequest(
                "workoutCount is derived and cannot be submitted".to_string(),
            ));
        }
        if !value.is_finite() || *value < 0.0 {
            return Err(ApiError::BadRequest(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    Ok(())
}

pub async fn log_activity(
    State(state): State<AppState>,
    Json(request): Json<LogActivityRequest>,
) -> Result<(StatusCode, Json<ActivityRecord>), ApiError> {
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }
    validate_metric_values(&request.metric_values)?;

    let mut record = ActivityRecord::new(
        UserId::from(user_id),
        request.kind,
        request.date.unwrap_or_else(Utc::now),
    );
    record.metric_values = request.metric_values;

    state.repository.append_activity_record(&record)?;
    info!("Logged {:?} {} for {}", record.kind, record.id, record.user_id);

    Ok((StatusCode::CREATED, Json(record)))
}
