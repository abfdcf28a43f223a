use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{macro_summary, MacroSummary};
use crate::models::{ActivityKind, ActivityRecord, ChallengeId, UserId};

#[derive(Debug, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct MacroSummaryResponse {
    pub challenge_id: String,
    pub week: u32,
    pub user_id: String,
    pub period: Period,
    pub summary: MacroSummary,
    /// Meals counted, oldest first
    pub meals: Vec<ActivityRecord>,
}

pub async fn challenge_week_macros(
    State(state): State<AppState>,
    Path((id, week, user_id)): Path<(String, u32, String)>,
) -> Result<Json<MacroSummaryResponse>, ApiError> {
    let challenge = state
        .repository
        .get_challenge(&ChallengeId::from(id.as_str()))?
        .ok_or_else(|| ApiError::NotFound(format!("Challenge {}", id)))?;
    let goal = challenge
        .goal_for_week(week)
        .ok_or_else(|| ApiError::NotFound(format!("Week {} of challenge {}", week, id)))?;

    let window = challenge.week_window(week);
    let mut meals: Vec<ActivityRecord> = state
        .repository
        .get_activity_records_for_user(&UserId::from(user_id.as_str()))?
        .into_iter()
        .filter(|r| r.kind == ActivityKind::Meal && window.contains(&r.date))
        .collect();
    meals.sort_by(|a, b| a.date.cmp(&b.date));

    let summary = macro_summary(&meals, &goal.macro_targets);

    Ok(Json(MacroSummaryResponse {
        challenge_id: id,
        week,
        user_id,
        period: Period {
            start: window.start.date_naive(),
            end: window.end.date_naive(),
        },
        summary,
        meals,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::test_support::{get_json, setup_test_state};
    use crate::models::{
        ActivityKind, ActivityRecord, Challenge, Macros, Metric, WeeklyGoal,
    };
    use crate::storage::ActivityRepository;
    use axum::http::StatusCode;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn seed(repo: &dyn ActivityRepository) {
        repo.save_challenge(&Challenge {
            id: "c1".into(),
            league_id: None,
            name: "Cut".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(),
            weekly_goals: vec![WeeklyGoal {
                week: 1,
                workout_target: 3,
                macro_targets: Macros {
                    protein: 100.0,
                    carbs: 200.0,
                    fat: 50.0,
                    calories: 2000.0,
                },
            }],
            participant_ids: vec!["alice".into()],
        })
        .unwrap();

        let meal = |day: u32, protein: f64| {
            ActivityRecord::new(
                "alice".into(),
                ActivityKind::Meal,
                Utc.with_ymd_and_hms(2025, 3, day, 13, 0, 0).unwrap(),
            )
            .with_value(Metric::Protein, protein)
            .with_value(Metric::Calories, 7000.0)
        };
        repo.append_activity_record(&meal(4, 420.0)).unwrap();
        repo.append_activity_record(&meal(3, 280.0)).unwrap();
        // following week
        repo.append_activity_record(&meal(10, 999.0)).unwrap();
    }

    #[tokio::test]
    async fn test_week_macro_summary() {
        let (repo, state) = setup_test_state();
        seed(repo.as_ref());
        let app = build_router(state);

        let (status, json) = get_json(app, "/api/macros/challenge/c1/week/1/user/alice").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["period"]["start"], "2025-03-03");
        assert_eq!(json["period"]["end"], "2025-03-09");
        assert_eq!(json["meals"].as_array().unwrap().len(), 2);
        assert_eq!(json["meals"][0]["date"], "2025-03-03T13:00:00Z");

        let summary = &json["summary"];
        assert_eq!(summary["weekly_totals"]["protein"], 700.0);
        assert_eq!(summary["weekly_totals"]["meals"], 2);
        assert_eq!(summary["daily_averages"]["protein"], 100.0);
        assert_eq!(summary["daily_averages"]["calories"], 2000.0);
        assert_eq!(summary["progress"]["protein"], 100.0);
        assert_eq!(summary["progress"]["carbs"], 0.0);
    }

    #[tokio::test]
    async fn test_missing_challenge_or_week() {
        let (repo, state) = setup_test_state();
        seed(repo.as_ref());
        let app = build_router(state);

        let (status, _) = get_json(app.clone(), "/api/macros/challenge/c9/week/1/user/alice").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json(app, "/api/macros/challenge/c1/week/5/user/alice").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
