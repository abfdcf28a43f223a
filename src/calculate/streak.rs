//! Check-in streaks and XP.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{CheckIn, CheckInStatus, DateWindow, StreakState};

/// Recompute streak state from a user's full check-in history.
///
/// The history may be in any order. Days are walked newest to oldest; a
/// `went` day extends the running count, a `going` day or a missing day
/// resets it. The current streak only counts the run that starts at
/// `today`, so it is 0 unless today is a `went` day. Check-ins dated after
/// `today` are ignored for streaks but still count towards XP.
pub fn compute_streak(history: &[CheckIn], today: NaiveDate) -> StreakState {
    let total_xp = history.iter().map(|c| c.xp_awarded).sum();
    let last_check_in_date = history.iter().map(|c| c.date).max();

    let mut days: Vec<&CheckIn> = history.iter().filter(|c| c.date <= today).collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));

    let mut run = 0u32;
    let mut longest = 0u32;
    let mut current = 0u32;
    let mut in_current_run = days.first().is_some_and(|c| c.date == today);
    let mut previous: Option<NaiveDate> = None;

    for check_in in days {
        if let Some(prev) = previous {
            if prev.pred_opt() != Some(check_in.date) {
                run = 0;
                in_current_run = false;
            }
        }

        match check_in.status {
            CheckInStatus::Went => {
                run += 1;
                longest = longest.max(run);
                if in_current_run {
                    current = run;
                }
            }
            CheckInStatus::Going => {
                run = 0;
                in_current_run = false;
            }
        }

        previous = Some(check_in.date);
    }

    StreakState {
        current_streak: current,
        longest_streak: longest,
        total_xp,
        last_check_in_date,
    }
}

/// Check-ins and XP collected inside a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckInSummary {
    pub check_ins: u32,
    pub xp: u32,
    /// Matching check-ins, oldest first
    pub days: Vec<CheckIn>,
}

/// Summarize the check-ins falling inside `window`.
pub fn summarize_check_ins(history: &[CheckIn], window: &DateWindow) -> CheckInSummary {
    let first = window.start.date_naive();
    let last = window.end.date_naive();

    let mut days: Vec<CheckIn> = history
        .iter()
        .filter(|c| c.date >= first && c.date <= last)
        .cloned()
        .collect();
    days.sort_by_key(|c| c.date);

    CheckInSummary {
        check_ins: days.len() as u32,
        xp: days.iter().map(|c| c.xp_awarded).sum(),
        days,
    }
}
