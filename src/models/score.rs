//! Weekly challenge scores and leaderboard rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChallengeId, MetricAggregate, ScoreEntryId, UserId};

/// One user's score for one challenge week. All scores are in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: ScoreEntryId,
    pub user_id: UserId,
    pub challenge_id: ChallengeId,
    pub week: u32,
    pub workout_score: u32,
    pub nutrition_score: u32,
    pub total_score: u32,
    pub computed_at: DateTime<Utc>,
}

/// Per-user totals fed into the leaderboard builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub user_id: UserId,
    pub total: f64,
    pub entries: u32,
    pub average: f64,
    pub last_activity: Option<DateTime<Utc>>,
}

impl Standing {
    /// Standing for a user from a metric aggregate.
    pub fn from_aggregate(user_id: UserId, aggregate: &MetricAggregate) -> Self {
        Self {
            user_id,
            total: aggregate.total,
            entries: aggregate.entries,
            average: aggregate.average,
            last_activity: aggregate.last_activity,
        }
    }
}

/// A ranked leaderboard line. Recomputed per query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// 1-based, strictly sequential
    pub rank: u32,
    pub user_id: UserId,
    pub total: f64,
    pub entries: u32,
    pub average: f64,
    pub last_activity: Option<DateTime<Utc>>,
}

impl LeaderboardRow {
    pub fn new(rank: u32, standing: Standing) -> Self {
        Self {
            rank,
            user_id: standing.user_id,
            total: standing.total,
            entries: standing.entries,
            average: standing.average,
            last_activity: standing.last_activity,
        }
    }
}
