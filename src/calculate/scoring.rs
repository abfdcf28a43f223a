//! Weekly challenge scoring.
//!
//! A week is scored on two axes, each 0-100:
//! - workouts completed against the weekly workout target
//! - average daily macros against the daily macro targets
//!
//! and combined as `round(0.6 * workout + 0.4 * nutrition)`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::CalculateError;
use crate::models::{
    ActivityKind, ActivityRecord, Challenge, ChallengeId, EntityId, MacroTotals, Macros,
    ScoreEntry, UserId, WeeklyGoal,
};

/// Weight of the workout score in the total.
pub const WORKOUT_WEIGHT: f64 = 0.6;

/// Weight of the nutrition score in the total.
pub const NUTRITION_WEIGHT: f64 = 0.4;

const DAYS_PER_WEEK: f64 = 7.0;
const MAX_SCORE: u32 = 100;

/// Workout score: share of the weekly target completed, capped at 100.
pub fn score_workout(completed: u32, target: i32) -> Result<u32, CalculateError> {
    if target <= 0 {
        return Err(CalculateError::InvalidGoal(format!(
            "workout target must be positive, got {}",
            target
        )));
    }
    if completed == 0 {
        return Ok(0);
    }

    let score = (100.0 * completed as f64 / target as f64).round() as u32;
    Ok(score.min(MAX_SCORE))
}

/// Nutrition score: mean of the per-macro scores, where each macro scores
/// `min(100, 100 * (weekly_total / 7) / daily_target)`.
pub fn score_nutrition(totals: &MacroTotals, targets: &Macros) -> Result<u32, CalculateError> {
    validate_targets(targets)?;
    if totals.meals == 0 {
        return Ok(0);
    }

    let daily = totals.macros.map(|total| total / DAYS_PER_WEEK);
    let per_macro: Vec<f64> = daily
        .values()
        .iter()
        .zip(targets.values())
        .map(|(average, target)| (100.0 * average / target).min(100.0))
        .collect();

    let mean = per_macro.iter().sum::<f64>() / per_macro.len() as f64;
    Ok(mean.round() as u32)
}

/// Weighted total of the workout and nutrition scores.
pub fn score_total(workout_score: u32, nutrition_score: u32) -> u32 {
    let workout = workout_score.min(MAX_SCORE) as f64;
    let nutrition = nutrition_score.min(MAX_SCORE) as f64;
    (workout * WORKOUT_WEIGHT + nutrition * NUTRITION_WEIGHT).round() as u32
}

/// Score one user's week. Pure apart from the fresh id and timestamp;
/// persisting the entry is up to the caller.
pub fn generate_score_entry(
    user_id: UserId,
    challenge_id: ChallengeId,
    week: u32,
    workouts: &[ActivityRecord],
    meals: &[ActivityRecord],
    goal: &WeeklyGoal,
) -> Result<ScoreEntry, CalculateError> {
    let workout_score = score_workout(workouts.len() as u32, goal.workout_target)?;

    let mut totals = MacroTotals::default();
    for meal in meals {
        totals.add(meal);
    }
    let nutrition_score = score_nutrition(&totals, &goal.macro_targets)?;

    Ok(ScoreEntry {
        id: EntityId::random("score"),
        user_id,
        challenge_id,
        week,
        workout_score,
        nutrition_score,
        total_score: score_total(workout_score, nutrition_score),
        computed_at: Utc::now(),
    })
}

/// Score `user_id` for a challenge week from their unfiltered records.
/// Only records inside the week's window are used.
pub fn score_week(
    user_id: &UserId,
    challenge: &Challenge,
    week: u32,
    records: &[ActivityRecord],
) -> Result<ScoreEntry, CalculateError> {
    let goal = challenge.goal_for_week(week).ok_or_else(|| {
        CalculateError::InvalidGoal(format!(
            "challenge {} has no goal for week {}",
            challenge.id, week
        ))
    })?;
    let window = challenge.week_window(week);

    let (workouts, meals): (Vec<ActivityRecord>, Vec<ActivityRecord>) = records
        .iter()
        .filter(|r| r.user_id == *user_id && window.contains(&r.date))
        .cloned()
        .partition(|r| r.kind == ActivityKind::Workout);

    generate_score_entry(
        user_id.clone(),
        challenge.id.clone(),
        week,
        &workouts,
        &meals,
        goal,
    )
}

/// Weekly macro breakdown for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSummary {
    pub weekly_totals: MacroTotals,
    pub daily_averages: Macros,
    pub targets: Macros,
    /// Percent of each daily target reached, not capped
    pub progress: Macros,
}

/// Summarize a week of meals against daily targets.
pub fn macro_summary(meals: &[ActivityRecord], targets: &Macros) -> MacroSummary {
    let mut weekly_totals = MacroTotals::default();
    for meal in meals.iter().filter(|m| m.kind == ActivityKind::Meal) {
        weekly_totals.add(meal);
    }

    let daily_averages = weekly_totals.macros.map(|total| total / DAYS_PER_WEEK);
    let percent = |average: f64, target: f64| {
        if target > 0.0 {
            100.0 * average / target
        } else {
            0.0
        }
    };

    MacroSummary {
        weekly_totals,
        daily_averages,
        targets: *targets,
        progress: Macros {
            protein: percent(daily_averages.protein, targets.protein),
            carbs: percent(daily_averages.carbs, targets.carbs),
            fat: percent(daily_averages.fat, targets.fat),
            calories: percent(daily_averages.calories, targets.calories),
        },
    }
}

fn validate_targets(targets: &Macros) -> Result<(), CalculateError> {
    let names = ["protein", "carbs", "fat", "calories"];
    for (name, target) in names.iter().zip(targets.values()) {
        if !(target.is_finite() && target > 0.0) {
            return Err(CalculateError::InvalidGoal(format!(
                "{} target must be positive, got {}",
                name, target
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metric, WeeklyGoal};
    use chrono::{DateTime, NaiveDate, TimeZone};

    fn targets() -> Macros {
        Macros {
            protein: 150.0,
            carbs: 200.0,
            fat: 80.0,
            calories: 2000.0,
        }
    }

    fn goal() -> WeeklyGoal {
        WeeklyGoal {
            week: 1,
            workout_target: 4,
            macro_targets: targets(),
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    fn meal(day: u32, macros: Macros) -> ActivityRecord {
        ActivityRecord::new("alice".into(), ActivityKind::Meal, at(day))
            .with_value(Metric::Protein, macros.protein)
            .with_value(Metric::Carbs, macros.carbs)
            .with_value(Metric::Fat, macros.fat)
            .with_value(Metric::Calories, macros.calories)
    }

    fn workout(day: u32) -> ActivityRecord {
        ActivityRecord::new("alice".into(), ActivityKind::Workout, at(day))
            .with_value(Metric::WorkoutMinutes, 30.0)
    }

    fn week_of_meals(scale: f64) -> Vec<ActivityRecord> {
        (3..10).map(|d| meal(d, targets().map(|t| t * scale))).collect()
    }

    fn totals(meals: &[ActivityRecord]) -> MacroTotals {
        let mut totals = MacroTotals::default();
        for m in meals {
            totals.add(m);
        }
        totals
    }

    #[test]
    fn test_workout_score() {
        assert_eq!(score_workout(0, 4), Ok(0));
        assert_eq!(score_workout(2, 4), Ok(50));
        assert_eq!(score_workout(1, 3), Ok(33));
        assert_eq!(score_workout(2, 3), Ok(67));
        assert_eq!(score_workout(4, 4), Ok(100));
        assert_eq!(score_workout(5, 4), Ok(100));
    }

    #[test]
    fn test_workout_score_rejects_unreachable_target() {
        assert!(matches!(score_workout(3, 0), Err(CalculateError::InvalidGoal(_))));
        assert!(matches!(score_workout(0, -2), Err(CalculateError::InvalidGoal(_))));
    }

    #[test]
    fn test_nutrition_score_on_target() {
        let meals = week_of_meals(1.0);
        assert_eq!(score_nutrition(&totals(&meals), &targets()), Ok(100));
    }

    #[test]
    fn test_nutrition_score_half_of_target() {
        let meals = week_of_meals(0.5);
        assert_eq!(score_nutrition(&totals(&meals), &targets()), Ok(50));
    }

    #[test]
    fn test_nutrition_score_caps_each_macro() {
        // protein at 300% cannot make up for the other three at 50%
        let mut meals = week_of_meals(0.5);
        for m in &mut meals {
            m.metric_values.insert("protein".to_string(), 450.0);
        }
        // (100 + 50 + 50 + 50) / 4 = 62.5 -> 63
        assert_eq!(score_nutrition(&totals(&meals), &targets()), Ok(63));
    }

    #[test]
    fn test_nutrition_score_no_meals() {
        assert_eq!(score_nutrition(&MacroTotals::default(), &targets()), Ok(0));
    }

    #[test]
    fn test_nutrition_score_rejects_zero_target() {
        let mut bad = targets();
        bad.fat = 0.0;
        let meals = week_of_meals(1.0);
        assert!(matches!(
            score_nutrition(&totals(&meals), &bad),
            Err(CalculateError::InvalidGoal(_))
        ));
    }

    #[test]
    fn test_total_score_weights() {
        assert_eq!(score_total(80, 60), 72);
        assert_eq!(score_total(100, 100), 100);
        assert_eq!(score_total(0, 0), 0);
        assert_eq!(score_total(50, 0), 30);
        assert_eq!(score_total(0, 50), 20);
    }

    #[test]
    fn test_generate_score_entry() {
        let workouts = vec![workout(3), workout(5)];
        let meals = week_of_meals(1.0);
        let entry =
            generate_score_entry("alice".into(), "spring".into(), 1, &workouts, &meals, &goal())
                .unwrap();

        assert_eq!(entry.workout_score, 50);
        assert_eq!(entry.nutrition_score, 100);
        assert_eq!(entry.total_score, 70);
        assert_eq!(entry.week, 1);
        assert!(entry.id.as_str().starts_with("score_"));
    }

    #[test]
    fn test_generate_score_entry_ids_are_unique() {
        let a = generate_score_entry("alice".into(), "c".into(), 1, &[], &[], &goal()).unwrap();
        let b = generate_score_entry("alice".into(), "c".into(), 1, &[], &[], &goal()).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.total_score, 0);
    }

    #[test]
    fn test_score_week_uses_only_records_in_week() {
        let challenge = Challenge {
            id: "spring".into(),
            league_id: None,
            name: "Spring".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(),
            weekly_goals: vec![goal()],
            participant_ids: vec!["alice".into()],
        };
        let mut records = week_of_meals(1.0);
        records.push(workout(4));
        records.push(workout(5));
        records.push(workout(12)); // week 2
        let mut other = workout(6);
        other.user_id = "bob".into();
        records.push(other);

        let entry = score_week(&"alice".into(), &challenge, 1, &records).unwrap();
        assert_eq!(entry.workout_score, 50);
        assert_eq!(entry.nutrition_score, 100);

        let missing = score_week(&"alice".into(), &challenge, 2, &records);
        assert!(matches!(missing, Err(CalculateError::InvalidGoal(_))));
    }

    #[test]
    fn test_macro_summary() {
        let meals = week_of_meals(0.5);
        let summary = macro_summary(&meals, &targets());

        assert_eq!(summary.weekly_totals.meals, 7);
        assert_eq!(summary.weekly_totals.macros.protein, 525.0);
        assert_eq!(summary.daily_averages.protein, 75.0);
        assert_eq!(summary.progress.protein, 50.0);
        assert_eq!(summary.progress.calories, 50.0);
        assert_eq!(summary.targets, targets());
    }
}
