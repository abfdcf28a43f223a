//! Ranked leaderboards.
//!
//! Standings are ordered by, in turn:
//! 1. total, descending
//! 2. entry count, descending
//! 3. average per entry, descending
//! 4. most recent activity, descending
//!
//! Anything still tied keeps its input order. Ranks are always 1..=N with no
//! shared numbers.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{LeaderboardRow, MetricAggregate, ScoreEntry, Standing, UserId};

/// Rank standings. Users without any contributing entry are left out.
pub fn build_leaderboard(standings: Vec<Standing>) -> Vec<LeaderboardRow> {
    let mut ranked: Vec<Standing> = standings.into_iter().filter(|s| s.entries > 0).collect();

    // sort_by is stable, so residual ties keep input order
    ranked.sort_by(compare_standings);

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, standing)| LeaderboardRow::new(i as u32 + 1, standing))
        .collect()
}

fn compare_standings(a: &Standing, b: &Standing) -> Ordering {
    b.total
        .total_cmp(&a.total)
        .then_with(|| b.entries.cmp(&a.entries))
        .then_with(|| b.average.total_cmp(&a.average))
        .then_with(|| b.last_activity.cmp(&a.last_activity))
}

/// Sum score entries per user across all weeks. Users appear in the order of
/// their first entry.
pub fn standings_from_scores(scores: &[ScoreEntry]) -> Vec<Standing> {
    let mut index: HashMap<&UserId, usize> = HashMap::new();
    let mut standings: Vec<Standing> = Vec::new();

    for score in scores {
        let slot = *index.entry(&score.user_id).or_insert_with(|| {
            standings.push(Standing {
                user_id: score.user_id.clone(),
                total: 0.0,
                entries: 0,
                average: 0.0,
                last_activity: None,
            });
            standings.len() - 1
        });

        let standing = &mut standings[slot];
        standing.total += score.total_score as f64;
        standing.entries += 1;
        if standing.last_activity.map_or(true, |last| score.computed_at > last) {
            standing.last_activity = Some(score.computed_at);
        }
    }

    for standing in &mut standings {
        standing.average = standing.total / standing.entries as f64;
    }

    standings
}

/// Standings from per-user metric aggregates, in the given order.
pub fn standings_from_aggregates<I>(aggregates: I) -> Vec<Standing>
where
    I: IntoIterator<Item = (UserId, MetricAggregate)>,
{
    aggregates
        .into_iter()
        .map(|(user_id, aggregate)| Standing::from_aggregate(user_id, &aggregate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    fn standing(user: &str, total: f64, entries: u32, last: Option<u32>) -> Standing {
        Standing {
            user_id: user.into(),
            total,
            entries,
            average: if entries > 0 { total / entries as f64 } else { 0.0 },
            last_activity: last.map(at),
        }
    }

    fn score(user: &str, week: u32, total: u32, day: u32) -> ScoreEntry {
        ScoreEntry {
            id: format!("score_{}_{}", user, week).into(),
            user_id: user.into(),
            challenge_id: "spring".into(),
            week,
            workout_score: total,
            nutrition_score: total,
            total_score: total,
            computed_at: at(day),
        }
    }

    fn order(rows: &[LeaderboardRow]) -> Vec<(u32, &str)> {
        rows.iter().map(|r| (r.rank, r.user_id.as_str())).collect()
    }

    #[test]
    fn test_sorted_by_total() {
        let rows = build_leaderboard(vec![
            standing("low", 100.0, 2, Some(3)),
            standing("high", 300.0, 2, Some(3)),
            standing("mid", 200.0, 2, Some(3)),
        ]);
        assert_eq!(order(&rows), vec![(1, "high"), (2, "mid"), (3, "low")]);
    }

    #[test]
    fn test_entries_break_total_tie() {
        let a = Standing {
            user_id: "A".into(),
            total: 650.0,
            entries: 7,
            average: 92.86,
            last_activity: Some(at(1)),
        };
        let b = Standing {
            user_id: "B".into(),
            total: 650.0,
            entries: 6,
            average: 96.67,
            last_activity: Some(at(2)),
        };
        let rows = build_leaderboard(vec![b, a]);
        assert_eq!(order(&rows), vec![(1, "A"), (2, "B")]);
    }

    #[test]
    fn test_average_breaks_entries_tie() {
        let mut a = standing("a", 300.0, 3, Some(5));
        let mut b = standing("b", 300.0, 3, Some(5));
        a.average = 90.0;
        b.average = 110.0;
        let rows = build_leaderboard(vec![a, b]);
        assert_eq!(order(&rows), vec![(1, "b"), (2, "a")]);
    }

    #[test]
    fn test_last_activity_breaks_average_tie() {
        let rows = build_leaderboard(vec![
            standing("early", 300.0, 3, Some(4)),
            standing("late", 300.0, 3, Some(9)),
        ]);
        assert_eq!(order(&rows), vec![(1, "late"), (2, "early")]);
    }

    #[test]
    fn test_full_tie_keeps_input_order() {
        let rows = build_leaderboard(vec![
            standing("first", 300.0, 3, Some(4)),
            standing("second", 300.0, 3, Some(4)),
            standing("third", 300.0, 3, Some(4)),
        ]);
        assert_eq!(order(&rows), vec![(1, "first"), (2, "second"), (3, "third")]);
    }

    #[test]
    fn test_ranks_are_sequential_even_when_tied() {
        let rows = build_leaderboard(vec![
            standing("a", 100.0, 1, Some(1)),
            standing("b", 100.0, 1, Some(1)),
        ]);
        let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn test_users_without_entries_are_excluded() {
        let rows = build_leaderboard(vec![
            standing("idle", 0.0, 0, None),
            standing("active", 10.0, 1, Some(2)),
        ]);
        assert_eq!(order(&rows), vec![(1, "active")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_leaderboard(Vec::new()).is_empty());
    }

    #[test]
    fn test_repeated_builds_are_identical() {
        let input = vec![
            standing("a", 50.0, 2, Some(3)),
            standing("b", 50.0, 2, Some(3)),
            standing("c", 70.0, 1, Some(1)),
        ];
        let first = build_leaderboard(input.clone());
        let second = build_leaderboard(input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_standings_from_scores_sums_weeks() {
        let scores = vec![
            score("bob", 1, 70, 9),
            score("alice", 1, 80, 9),
            score("bob", 2, 90, 16),
            score("alice", 2, 60, 16),
            score("carol", 1, 100, 9),
        ];
        let standings = standings_from_scores(&scores);

        let users: Vec<&str> = standings.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(users, vec!["bob", "alice", "carol"]);

        let bob = &standings[0];
        assert_eq!(bob.total, 160.0);
        assert_eq!(bob.entries, 2);
        assert_eq!(bob.average, 80.0);
        assert_eq!(bob.last_activity, Some(at(16)));

        let rows = build_leaderboard(standings);
        assert_eq!(order(&rows), vec![(1, "bob"), (2, "alice"), (3, "carol")]);
    }

    #[test]
    fn test_standings_from_aggregates() {
        let aggregates = vec![
            (
                UserId::from("alice"),
                MetricAggregate {
                    total: 300.0,
                    entries: 3,
                    average: 100.0,
                    last_activity: Some(at(4)),
                },
            ),
            (UserId::from("bob"), MetricAggregate::default()),
        ];
        let standings = standings_from_aggregates(aggregates);
        assert_eq!(standings.len(), 2);

        let rows = build_leaderboard(standings);
        assert_eq!(order(&rows), vec![(1, "alice")]);
        assert_eq!(rows[0].average, 100.0);
    }
}
