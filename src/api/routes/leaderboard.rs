use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::cache::{CacheKey, LeaderboardScope};
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::parse_window;
use crate::models::{LeaderboardRow, Metric, Window};
use crate::standings::{self, parse_group_metric};

#[derive(Debug, Deserialize)]
pub struct GroupLeaderboardParams {
    pub metric: Option<String>,
    pub window: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<Window>,
    pub rows: Vec<LeaderboardRow>,
}

/// Serve `key` from the cache or compute it and remember the result.
async fn cached<F>(state: &AppState, key: CacheKey, compute: F) -> Result<Vec<LeaderboardRow>, ApiError>
where
    F: FnOnce() -> Result<Vec<LeaderboardRow>, ApiError>,
{
    if let Some(rows) = state.leaderboards.write().await.get(&key) {
        return Ok(rows);
    }
    let rows = compute()?;
    state.leaderboards.write().await.insert(key, rows.clone());
    Ok(rows)
}

pub async fn group_leaderboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<GroupLeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let metric = parse_group_metric(params.metric.as_deref().unwrap_or("protein"))?;
    let window = parse_window(params.window.as_deref().unwrap_or("week"))?;
    let now = Utc::now();

    let key = CacheKey::group(
        &id,
        metric,
        window,
        &window.bounds(now),
        state.repository.data_version(),
    );
    let rows = cached(&state, key, || {
        Ok(standings::group_leaderboard(
            state.repository.as_ref(),
            &id.as_str().into(),
            metric,
            window,
            now,
        )?)
    })
    .await?;

    Ok(Json(LeaderboardResponse {
        id,
        metric: Some(metric),
        window: Some(window),
        rows,
    }))
}

pub async fn challenge_leaderboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let key = CacheKey::scores(
        LeaderboardScope::Challenge,
        &id,
        state.repository.data_version(),
    );
    let rows = cached(&state, key, || {
        Ok(standings::challenge_leaderboard(
            state.repository.as_ref(),
            &id.as_str().into(),
        )?)
    })
    .await?;

    Ok(Json(LeaderboardResponse {
        id,
        metric: None,
        window: None,
        rows,
    }))
}

pub async fn league_leaderboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let key = CacheKey::scores(LeaderboardScope::League, &id, state.repository.data_version());
    let rows = cached(&state, key, || {
        Ok(standings::league_leaderboard(
            state.repository.as_ref(),
            &id.as_str().into(),
        )?)
    })
    .await?;

    Ok(Json(LeaderboardResponse {
        id,
        metric: None,
        window: None,
        rows,
    }))
}
