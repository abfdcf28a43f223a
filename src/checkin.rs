//! Check-in workflow.
//!
//! Every submission is: upsert today's check-in, re-read the user's whole
//! history, recompute the streak state from scratch and store it. The
//! sequence runs under a per-user lock so two submissions for the same user
//! cannot interleave and lose an update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::calculate::{compute_streak, summarize_check_ins, CheckInSummary};
use crate::models::{CheckIn, CheckInStatus, DateWindow, StreakState, UserId};
use crate::storage::{ActivityRepository, StorageError};

#[derive(Debug, Error)]
pub enum CheckInError {
    /// Days before the user's latest check-in are closed.
    #[error("Cannot check in for {date}: latest check-in is {latest}")]
    Backdated { date: NaiveDate, latest: NaiveDate },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of a check-in submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInOutcome {
    pub check_in: CheckIn,
    pub streak: StreakState,
}

/// Streak plus this week's and last week's activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInStats {
    pub streak: StreakState,
    pub this_week: CheckInSummary,
    pub last_week: CheckInSummary,
}

#[derive(Default)]
struct UserLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    fn for_user(&self, user_id: &UserId) -> Result<Arc<Mutex<()>>, StorageError> {
        let mut locks = self.inner.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(locks.entry(user_id.clone()).or_default().clone())
    }

    /// Drop the user's lock once nobody else holds it.
    fn release(&self, user_id: &UserId) -> Result<(), StorageError> {
        let mut locks = self.inner.lock().map_err(|_| StorageError::LockPoisoned)?;
        if locks
            .get(user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(user_id);
        }
        Ok(())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}

/// Records check-ins and serves streak stats.
pub struct CheckInService {
    repository: Arc<dyn ActivityRepository>,
    locks: UserLocks,
}

impl CheckInService {
    pub fn new(repository: Arc<dyn ActivityRepository>) -> Self {
        Self {
            repository,
            locks: UserLocks::default(),
        }
    }

    /// Record (or overwrite) the user's check-in for `date` and recompute
    /// their streak. `date` may not be earlier than the user's latest
    /// check-in.
    pub fn record(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        status: CheckInStatus,
    ) -> Result<CheckInOutcome, CheckInError> {
        let lock = self.locks.for_user(user_id)?;
        let outcome = {
            let _guard = lock.lock().map_err(|_| StorageError::LockPoisoned)?;
            self.record_locked(user_id, date, status)
        };
        drop(lock);
        self.locks.release(user_id)?;
        outcome
    }

    fn record_locked(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        status: CheckInStatus,
    ) -> Result<CheckInOutcome, CheckInError> {
        let existing = self.repository.get_check_ins_for_user(user_id)?;
        if let Some(latest) = existing.iter().map(|c| c.date).max() {
            if date < latest {
                return Err(CheckInError::Backdated { date, latest });
            }
        }

        let check_in = self
            .repository
            .upsert_check_in(CheckIn::new(user_id.clone(), date, status))?;
        let history = self.repository.get_check_ins_for_user(user_id)?;
        let streak = compute_streak(&history, date);
        self.repository.save_streak_state(user_id, &streak)?;

        info!(
            "Check-in {} for {} on {}: streak {} (longest {}), {} XP",
            status, user_id, date, streak.current_streak, streak.longest_streak, streak.total_xp
        );

        Ok(CheckInOutcome { check_in, streak })
    }

    /// The user's check-in for `date`, if any.
    pub fn today(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<CheckIn>, StorageError> {
        let history = self.repository.get_check_ins_for_user(user_id)?;
        Ok(history.into_iter().find(|c| c.date == date))
    }

    /// Full history, newest first.
    pub fn history(&self, user_id: &UserId) -> Result<Vec<CheckIn>, StorageError> {
        let mut history = self.repository.get_check_ins_for_user(user_id)?;
        history.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(history)
    }

    /// Stored streak state plus the week containing `today` and the one
    /// before it.
    pub fn stats(&self, user_id: &UserId, today: NaiveDate) -> Result<CheckInStats, StorageError> {
        let streak = self
            .repository
            .get_streak_state(user_id)?
            .unwrap_or_default();
        let history = self.repository.get_check_ins_for_user(user_id)?;
        debug!("Loaded {} check-ins for {}", history.len(), user_id);

        let this_week = DateWindow::week_of(today);
        let last_week = DateWindow::week_of(today - Duration::days(7));

        Ok(CheckInStats {
            streak,
            this_week: summarize_check_ins(&history, &this_week),
            last_week: summarize_check_ins(&history, &last_week),
        })
    }
}
