//! In-memory repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ActivityRepository, StorageError};
use crate::models::{
    ActivityRecord, Challenge, ChallengeId, CheckIn, Group, GroupId, ScoreEntry, StreakState,
    UserId,
};

#[derive(Debug, Default)]
struct Tables {
    check_ins: HashMap<UserId, Vec<CheckIn>>,
    streaks: HashMap<UserId, StreakState>,
    activities: Vec<ActivityRecord>,
    challenges: Vec<Challenge>,
    groups: Vec<Group>,
    scores: Vec<ScoreEntry>,
}

/// [`ActivityRepository`] kept entirely in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
    version: AtomicU64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables.read().map_err(|_| StorageError::LockPoisoned)
    }

    /// Run a mutation and bump the data version.
    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> Result<R, StorageError> {
        let mut tables: RwLockWriteGuard<'_, Tables> =
            self.tables.write().map_err(|_| StorageError::LockPoisoned)?;
        let result = f(&mut tables);
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(result)
    }
}

impl ActivityRepository for MemoryRepository {
    fn get_check_ins_for_user(&self, user_id: &UserId) -> Result<Vec<CheckIn>, StorageError> {
        Ok(self
            .read()?
            .check_ins
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn upsert_check_in(&self, check_in: CheckIn) -> Result<CheckIn, StorageError> {
        self.write(|tables| {
            let days = tables.check_ins.entry(check_in.user_id.clone()).or_default();
            match days.iter_mut().find(|c| c.date == check_in.date) {
                Some(existing) => *existing = check_in.clone(),
                None => days.push(check_in.clone()),
            }
            check_in
        })
    }

    fn get_streak_state(&self, user_id: &UserId) -> Result<Option<StreakState>, StorageError> {
        Ok(self.read()?.streaks.get(user_id).cloned())
    }

    fn save_streak_state(
        &self,
        user_id: &UserId,
        state: &StreakState,
    ) -> Result<(), StorageError> {
        self.write(|tables| {
            tables.streaks.insert(user_id.clone(), state.clone());
        })
    }

    fn get_activity_records_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ActivityRecord>, StorageError> {
        Ok(self
            .read()?
            .activities
            .iter()
            .filter(|r| r.user_id == *user_id)
            .cloned()
            .collect())
    }

    fn append_activity_record(&self, record: &ActivityRecord) -> Result<(), StorageError> {
        self.write(|tables| tables.activities.push(record.clone()))
    }

    fn get_challenge(&self, id: &ChallengeId) -> Result<Option<Challenge>, StorageError> {
        Ok(self.read()?.challenges.iter().find(|c| c.id == *id).cloned())
    }

    fn list_challenges(&self) -> Result<Vec<Challenge>, StorageError> {
        Ok(self.read()?.challenges.clone())
    }

    fn save_challenge(&self, challenge: &Challenge) -> Result<(), StorageError> {
        self.write(|tables| {
            match tables.challenges.iter_mut().find(|c| c.id == challenge.id) {
                Some(existing) => *existing = challenge.clone(),
                None => tables.challenges.push(challenge.clone()),
            }
        })
    }

    fn get_group(&self, id: &GroupId) -> Result<Option<Group>, StorageError> {
        Ok(self.read()?.groups.iter().find(|g| g.id == *id).cloned())
    }

    fn save_group(&self, group: &Group) -> Result<(), StorageError> {
        self.write(|tables| match tables.groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group.clone(),
            None => tables.groups.push(group.clone()),
        })
    }

    fn get_scores_for_challenge(&self, id: &ChallengeId) -> Result<Vec<ScoreEntry>, StorageError> {
        Ok(self
            .read()?
            .scores
            .iter()
            .filter(|s| s.challenge_id == *id)
            .cloned()
            .collect())
    }

    fn append_scores(&self, scores: &[ScoreEntry]) -> Result<usize, StorageError> {
        if scores.is_empty() {
            return Ok(0);
        }
        self.write(|tables| {
            tables.scores.extend_from_slice(scores);
            scores.len()
        })
    }

    fn data_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}
