//! Activity repository.
//!
//! The engine only reads and writes records through [`ActivityRepository`]:
//! - [`JsonlRepository`]: JSONL files under the data directory, the source
//!   of truth for a running server
//! - [`MemoryRepository`]: maps in memory, for tests and dry runs

mod jsonl;
mod memory;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{
    ActivityRecord, Challenge, ChallengeId, CheckIn, Group, GroupId, ScoreEntry, StreakState,
    UserId,
};

pub use jsonl::{EntityType, JsonlReader, JsonlRepository, JsonlWriter};
pub use memory::MemoryRepository;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join("records")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Read/write access to users' records.
///
/// Implementations must be safe to share between request handlers. They do
/// not serialize a user's read-modify-write sequences on their own; the
/// check-in workflow holds a per-user lock around those.
pub trait ActivityRepository: Send + Sync {
    /// All check-ins for a user, in no particular order.
    fn get_check_ins_for_user(&self, user_id: &UserId) -> Result<Vec<CheckIn>, StorageError>;

    /// Insert the check-in, or replace the user's entry for the same day.
    fn upsert_check_in(&self, check_in: CheckIn) -> Result<CheckIn, StorageError>;

    fn get_streak_state(&self, user_id: &UserId) -> Result<Option<StreakState>, StorageError>;

    fn save_streak_state(&self, user_id: &UserId, state: &StreakState)
        -> Result<(), StorageError>;

    fn get_activity_records_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ActivityRecord>, StorageError>;

    fn append_activity_record(&self, record: &ActivityRecord) -> Result<(), StorageError>;

    fn get_challenge(&self, id: &ChallengeId) -> Result<Option<Challenge>, StorageError>;

    fn list_challenges(&self) -> Result<Vec<Challenge>, StorageError>;

    /// Insert or replace a challenge by id.
    fn save_challenge(&self, challenge: &Challenge) -> Result<(), StorageError>;

    fn get_group(&self, id: &GroupId) -> Result<Option<Group>, StorageError>;

    /// Insert or replace a group by id.
    fn save_group(&self, group: &Group) -> Result<(), StorageError>;

    fn get_scores_for_challenge(&self, id: &ChallengeId) -> Result<Vec<ScoreEntry>, StorageError>;

    fn append_scores(&self, scores: &[ScoreEntry]) -> Result<usize, StorageError>;

    /// Counter bumped by every successful write.
    fn data_version(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));
        assert_eq!(config.records_dir(), PathBuf::from("/data/records"));
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}
