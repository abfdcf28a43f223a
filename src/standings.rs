//! Leaderboards and weekly score generation over the repository.
//!
//! The ranking itself lives in [`crate::calculate`]; this module loads the
//! records each leaderboard ranks over and persists generated scores.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::calculate::{
    aggregate_in_window, build_leaderboard, parse_metric, score_week, standings_from_aggregates,
    standings_from_scores, CalculateError,
};
use crate::models::{
    ChallengeId, GroupId, LeaderboardRow, LeagueId, Metric, ScoreEntry, UserId, Window,
};
use crate::storage::{ActivityRepository, StorageError};

/// Metrics a group leaderboard can rank by.
pub const GROUP_METRICS: [Metric; 3] = [Metric::Protein, Metric::Calories, Metric::WorkoutMinutes];

#[derive(Debug, Error)]
pub enum StandingsError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Calculate(#[from] CalculateError),
}

/// Resolve a group leaderboard metric by wire name.
pub fn parse_group_metric(name: &str) -> Result<Metric, CalculateError> {
    let metric = parse_metric(name)?;
    if GROUP_METRICS.contains(&metric) {
        Ok(metric)
    } else {
        Err(CalculateError::UnknownMetric(name.to_string()))
    }
}

/// Rank a group's members by `metric` over `window` resolved at `now`.
pub fn group_leaderboard(
    repository: &dyn ActivityRepository,
    group_id: &GroupId,
    metric: Metric,
    window: Window,
    now: DateTime<Utc>,
) -> Result<Vec<LeaderboardRow>, StandingsError> {
    let group = repository
        .get_group(group_id)?
        .ok_or_else(|| StandingsError::NotFound(format!("Group {}", group_id)))?;
    let bounds = window.bounds(now);

    let mut aggregates = Vec::with_capacity(group.member_ids.len());
    for member in &group.member_ids {
        let records = repository.get_activity_records_for_user(member)?;
        aggregates.push((member.clone(), aggregate_in_window(&records, metric, &bounds)));
    }
    debug!(
        "Aggregated {} over {} for {} members of {}",
        metric,
        window,
        aggregates.len(),
        group_id
    );

    Ok(build_leaderboard(standings_from_aggregates(aggregates)))
}

/// Rank a challenge's participants by their summed weekly scores.
pub fn challenge_leaderboard(
    repository: &dyn ActivityRepository,
    challenge_id: &ChallengeId,
) -> Result<Vec<LeaderboardRow>, StandingsError> {
    if repository.get_challenge(challenge_id)?.is_none() {
        return Err(StandingsError::NotFound(format!("Challenge {}", challenge_id)));
    }
    let scores = latest_per_week(repository.get_scores_for_challenge(challenge_id)?);
    Ok(build_leaderboard(standings_from_scores(&scores)))
}

/// Rank users across every challenge belonging to a league.
pub fn league_leaderboard(
    repository: &dyn ActivityRepository,
    league_id: &LeagueId,
) -> Result<Vec<LeaderboardRow>, StandingsError> {
    let mut scores = Vec::new();
    for challenge in repository
        .list_challenges()?
        .into_iter()
        .filter(|c| c.league_id.as_ref() == Some(league_id))
    {
        scores.extend(repository.get_scores_for_challenge(&challenge.id)?);
    }
    let scores = latest_per_week(scores);
    Ok(build_leaderboard(standings_from_scores(&scores)))
}

/// Score every participant of a challenge for `week` and store the entries.
pub fn generate_week_scores(
    repository: &dyn ActivityRepository,
    challenge_id: &ChallengeId,
    week: u32,
) -> Result<Vec<ScoreEntry>, StandingsError> {
    let challenge = repository
        .get_challenge(challenge_id)?
        .ok_or_else(|| StandingsError::NotFound(format!("Challenge {}", challenge_id)))?;

    let mut entries = Vec::with_capacity(challenge.participant_ids.len());
    for user_id in &challenge.participant_ids {
        let records = repository.get_activity_records_for_user(user_id)?;
        entries.push(score_week(user_id, &challenge, week, &records)?);
    }

    let written = repository.append_scores(&entries)?;
    info!(
        "Generated {} scores for challenge {} week {}",
        written, challenge_id, week
    );
    Ok(entries)
}

/// Keep only the most recently computed entry per user, challenge and week,
/// so regenerating a week replaces its scores instead of adding to them.
fn latest_per_week(scores: Vec<ScoreEntry>) -> Vec<ScoreEntry> {
    let mut index: HashMap<(ChallengeId, UserId, u32), usize> = HashMap::new();
    let mut latest: Vec<ScoreEntry> = Vec::with_capacity(scores.len());

    for score in scores {
        let key = (score.challenge_id.clone(), score.user_id.clone(), score.week);
        match index.get(&key) {
            Some(&slot) => {
                if score.computed_at >= latest[slot].computed_at {
                    latest[slot] = score;
                }
            }
            None => {
                index.insert(key, latest.len());
                latest.push(score);
            }
        }
    }

    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ActivityKind, ActivityRecord, Challenge, Group, Macros, ScoreEntryId, WeeklyGoal,
    };
    use crate::storage::MemoryRepository;
    use chrono::{Duration, NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn challenge(id: &str, league: Option<&str>, participants: &[&str]) -> Challenge {
        Challenge {
            id: id.into(),
            league_id: league.map(Into::into),
            name: format!("Challenge {}", id),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 30).unwrap(),
            weekly_goals: vec![WeeklyGoal {
                week: 1,
                workout_target: 4,
                macro_targets: Macros {
                    protein: 150.0,
                    carbs: 200.0,
                    fat: 70.0,
                    calories: 2200.0,
                },
            }],
            participant_ids: participants.iter().map(|p| UserId::from(*p)).collect(),
        }
    }

    fn workout(user: &str, when: DateTime<Utc>, minutes: f64) -> ActivityRecord {
        ActivityRecord::new(user.into(), ActivityKind::Workout, when)
            .with_value(Metric::WorkoutMinutes, minutes)
    }

    fn users(rows: &[LeaderboardRow]) -> Vec<&str> {
        rows.iter().map(|r| r.user_id.as_str()).collect()
    }

    #[test]
    fn test_parse_group_metric() {
        assert_eq!(parse_group_metric("workoutMinutes").unwrap(), Metric::WorkoutMinutes);
        assert_eq!(
            parse_group_metric("carbs"),
            Err(CalculateError::UnknownMetric("carbs".to_string()))
        );
        assert!(parse_group_metric("steps").is_err());
    }

    #[test]
    fn test_group_leaderboard_ranks_members_in_window() {
        let repo = MemoryRepository::new();
        repo.save_group(&Group {
            id: "g1".into(),
            name: "Gym".to_string(),
            member_ids: vec!["alice".into(), "bob".into(), "carol".into()],
        })
        .unwrap();
        repo.append_activity_record(&workout("alice", at(11, 8), 30.0)).unwrap();
        repo.append_activity_record(&workout("bob", at(10, 8), 45.0)).unwrap();
        // previous week, outside the window
        repo.append_activity_record(&workout("alice", at(7, 8), 90.0)).unwrap();
        // not a member
        repo.append_activity_record(&workout("dave", at(11, 8), 120.0)).unwrap();

        let rows = group_leaderboard(
            &repo,
            &"g1".into(),
            Metric::WorkoutMinutes,
            Window::Week,
            at(12, 18),
        )
        .unwrap();

        assert_eq!(users(&rows), vec!["bob", "alice"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].total, 30.0);
    }

    #[test]
    fn test_group_leaderboard_unknown_group() {
        let repo = MemoryRepository::new();
        let err = group_leaderboard(
            &repo,
            &"missing".into(),
            Metric::Protein,
            Window::All,
            at(12, 0),
        )
        .unwrap_err();
        assert!(matches!(err, StandingsError::NotFound(_)));
    }

    #[test]
    fn test_generate_and_rank_challenge_scores() {
        let repo = MemoryRepository::new();
        repo.save_challenge(&challenge("c1", None, &["alice", "bob"])).unwrap();
        for day in 3..7 {
            repo.append_activity_record(&workout("alice", at(day, 7), 30.0)).unwrap();
        }
        repo.append_activity_record(&workout("bob", at(4, 7), 30.0)).unwrap();

        let entries = generate_week_scores(&repo, &"c1".into(), 1).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].workout_score, 100);
        assert_eq!(entries[0].total_score, 60);
        assert_eq!(entries[1].workout_score, 25);

        let rows = challenge_leaderboard(&repo, &"c1".into()).unwrap();
        assert_eq!(users(&rows), vec!["alice", "bob"]);
        assert_eq!(rows[0].total, 60.0);
        assert_eq!(rows[1].total, 15.0);
    }

    #[test]
    fn test_regenerating_a_week_replaces_scores() {
        let repo = MemoryRepository::new();
        repo.save_challenge(&challenge("c1", None, &["alice"])).unwrap();
        repo.append_activity_record(&workout("alice", at(3, 7), 30.0)).unwrap();

        generate_week_scores(&repo, &"c1".into(), 1).unwrap();
        repo.append_activity_record(&workout("alice", at(4, 7), 30.0)).unwrap();
        generate_week_scores(&repo, &"c1".into(), 1).unwrap();

        let rows = challenge_leaderboard(&repo, &"c1".into()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entries, 1);
        assert_eq!(rows[0].total, 30.0);
    }

    #[test]
    fn test_generate_without_goal_is_invalid() {
        let repo = MemoryRepository::new();
        repo.save_challenge(&challenge("c1", None, &["alice"])).unwrap();
        let err = generate_week_scores(&repo, &"c1".into(), 2).unwrap_err();
        assert!(matches!(err, StandingsError::Calculate(CalculateError::InvalidGoal(_))));
        assert!(repo.get_scores_for_challenge(&"c1".into()).unwrap().is_empty());
    }

    #[test]
    fn test_challenge_leaderboard_unknown_challenge() {
        let repo = MemoryRepository::new();
        let err = challenge_leaderboard(&repo, &"nope".into()).unwrap_err();
        assert!(matches!(err, StandingsError::NotFound(_)));
    }

    #[test]
    fn test_league_leaderboard_sums_league_challenges() {
        let repo = MemoryRepository::new();
        repo.save_challenge(&challenge("c1", Some("l1"), &["alice", "bob"])).unwrap();
        repo.save_challenge(&challenge("c2", Some("l1"), &["bob"])).unwrap();
        repo.save_challenge(&challenge("c3", None, &["alice"])).unwrap();
        repo.append_activity_record(&workout("alice", at(3, 7), 30.0)).unwrap();
        repo.append_activity_record(&workout("bob", at(3, 7), 30.0)).unwrap();

        for id in ["c1", "c2", "c3"] {
            generate_week_scores(&repo, &id.into(), 1).unwrap();
        }

        let rows = league_leaderboard(&repo, &"l1".into()).unwrap();
        assert_eq!(users(&rows), vec!["bob", "alice"]);
        assert_eq!(rows[0].entries, 2);
        assert_eq!(rows[1].entries, 1);

        assert!(league_leaderboard(&repo, &"empty".into()).unwrap().is_empty());
    }

    #[test]
    fn test_latest_per_week_keeps_newest() {
        let base = at(10, 0);
        let entry = |user: &str, week: u32, total: u32, minutes: i64| ScoreEntry {
            id: ScoreEntryId::random("score"),
            user_id: user.into(),
            challenge_id: "c1".into(),
            week,
            workout_score: 0,
            nutrition_score: 0,
            total_score: total,
            computed_at: base + Duration::minutes(minutes),
        };

        let kept = latest_per_week(vec![
            entry("alice", 1, 10, 0),
            entry("bob", 1, 20, 0),
            entry("alice", 1, 40, 5),
            entry("alice", 2, 50, 1),
        ]);

        let totals: Vec<u32> = kept.iter().map(|s| s.total_score).collect();
        assert_eq!(totals, vec![40, 20, 50]);
    }
}
