//! Scoring and leaderboard engine.
//!
//! Pure functions over already-loaded records:
//! - Check-in streaks and XP
//! - Metric aggregation over time windows
//! - Workout / nutrition / total scores against weekly goals
//! - Ranked leaderboards with a deterministic tie-break chain
//!
//! Nothing here touches storage; callers load records through an
//! [`ActivityRepository`](crate::storage::ActivityRepository) and persist results.

pub mod aggregate;
pub mod leaderboard;
pub mod scoring;
pub mod streak;

use thiserror::Error;

pub use aggregate::{aggregate_in_window, aggregate_metric, parse_metric, parse_window};
pub use leaderboard::{build_leaderboard, standings_from_aggregates, standings_from_scores};
pub use scoring::{
    generate_score_entry, macro_summary, score_nutrition, score_total, score_week, score_workout,
    MacroSummary, NUTRITION_WEIGHT, WORKOUT_WEIGHT,
};
pub use streak::{compute_streak, summarize_check_ins, CheckInSummary};

/// Contract violations detected by the engine.
#[derive(Debug, Error, PartialEq)]
pub enum CalculateError {
    /// A goal that cannot be scored against (non-positive target, missing week).
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown window: {0}")]
    UnknownWindow(String),
}
