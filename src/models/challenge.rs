//! Challenges, their weekly goals, and groups.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{ChallengeId, DateWindow, GroupId, LeagueId, Macros, UserId};

/// Goal for one week of a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGoal {
    /// 1-based week index within the challenge
    pub week: u32,

    /// Workouts expected during the week; must be positive
    pub workout_target: i32,

    /// Daily targets for each tracked macro
    pub macro_targets: Macros,
}

/// A time-boxed challenge with per-week goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,

    /// League this challenge counts towards, if any
    #[serde(default)]
    pub league_id: Option<LeagueId>,

    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default)]
    pub weekly_goals: Vec<WeeklyGoal>,

    #[serde(default)]
    pub participant_ids: Vec<UserId>,
}

impl Challenge {
    /// Goal for a 1-based week, if defined.
    pub fn goal_for_week(&self, week: u32) -> Option<&WeeklyGoal> {
        self.weekly_goals.iter().find(|g| g.week == week)
    }

    /// Days covered by a 1-based week: seven days starting
    /// `7 * (week - 1)` days after the challenge start.
    pub fn week_window(&self, week: u32) -> DateWindow {
        let offset = 7 * (week.max(1) as i64 - 1);
        let first = self.start_date + Duration::days(offset);
        DateWindow::from_days(first, first + Duration::days(6))
    }
}

/// A set of users sharing a leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<UserId>,
}
