//! Daily check-ins and the streak state derived from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::UserId;

/// XP for a completed workout day.
pub const WENT_XP: u32 = 15;

/// XP for announcing a workout.
pub const GOING_XP: u32 = 10;

/// What the user reported for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInStatus {
    /// Workout done.
    Went,
    /// Workout planned, not yet done.
    Going,
}

impl CheckInStatus {
    /// XP awarded for a check-in with this status.
    pub fn xp(&self) -> u32 {
        match self {
            CheckInStatus::Went => WENT_XP,
            CheckInStatus::Going => GOING_XP,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInStatus::Went => "went",
            CheckInStatus::Going => "going",
        }
    }
}

impl std::fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CheckInStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "went" => Ok(CheckInStatus::Went),
            "going" => Ok(CheckInStatus::Going),
            other => Err(format!(
                "Status must be either \"went\" or \"going\", got {:?}",
                other
            )),
        }
    }
}

/// One check-in. At most one per user per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub user_id: UserId,

    /// Calendar day (UTC) the check-in belongs to
    pub date: NaiveDate,

    pub status: CheckInStatus,

    /// XP granted for this day; replaced when the day is re-submitted
    pub xp_awarded: u32,

    /// Last time this day's entry was written
    pub updated_at: DateTime<Utc>,
}

impl CheckIn {
    /// Create a check-in with XP derived from the status.
    pub fn new(user_id: UserId, date: NaiveDate, status: CheckInStatus) -> Self {
        Self {
            user_id,
            date,
            status,
            xp_awarded: status.xp(),
            updated_at: Utc::now(),
        }
    }
}

/// Streak and XP totals for a user, always recomputed from the full history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_xp: u32,
    pub last_check_in_date: Option<NaiveDate>,
}
