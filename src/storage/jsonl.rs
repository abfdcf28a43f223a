//! JSONL (JSON Lines) storage.
//!
//! One file per entity type, one JSON object per line. Immutable records
//! (activities, scores) are appended; mutable ones (check-ins, streaks,
//! challenges, groups) are rewritten in full.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ActivityRepository, StorageConfig, StorageError};
use crate::models::{
    ActivityRecord, Challenge, ChallengeId, CheckIn, Group, GroupId, ScoreEntry, StreakState,
    UserId,
};

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    CheckIn,
    Streak,
    Activity,
    Score,
    Challenge,
    Group,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::CheckIn => "check_ins.jsonl",
            EntityType::Streak => "streaks.jsonl",
            EntityType::Activity => "activities.jsonl",
            EntityType::Score => "scores.jsonl",
            EntityType::Challenge => "challenges.jsonl",
            EntityType::Group => "groups.jsonl",
        }
    }
}

fn entity_path(config: &StorageConfig, entity: EntityType) -> PathBuf {
    config.records_dir().join(entity.filename())
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for an entity type.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(entity_path(config, entity))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single entity to the file.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.append_batch(std::slice::from_ref(entity)).map(|_| ())
    }

    /// Append multiple entities to the file.
    pub fn append_batch(&self, entities: &[T]) -> Result<usize, StorageError> {
        if entities.is_empty() {
            return Ok(0);
        }

        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let count = write_lines(BufWriter::new(file), entities)?;
        debug!("Appended {} entities to {:?}", count, self.path);

        Ok(count)
    }

    /// Write entities, replacing the entire file.
    ///
    /// Lines go to a sibling temp file which is then renamed over the
    /// target, so readers see either the old or the new contents.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let tmp_path = self.tmp_path();
        let file = File::create(&tmp_path)?;
        let count = write_lines(BufWriter::new(file), entities)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!("Wrote {} entities to {:?}", count, self.path);

        Ok(count)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_lines<T: Serialize>(
    mut writer: BufWriter<File>,
    entities: &[T],
) -> Result<usize, StorageError> {
    for entity in entities {
        let json = serde_json::to_string(entity)?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(entities.len())
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for an entity type.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(entity_path(config, entity))
    }

    /// Read all entities from the file. A missing file reads as empty;
    /// unparseable lines are logged and skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        index + 1,
                        self.path,
                        e
                    );
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Read entities matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(predicate).collect())
    }
}

/// Stored line for a user's streak state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StreakLine {
    user_id: UserId,
    #[serde(flatten)]
    state: StreakState,
}

/// [`ActivityRepository`] over JSONL files in `<data_dir>/records/`.
pub struct JsonlRepository {
    config: StorageConfig,
    /// Readers share it; file mutation takes it exclusively
    files_lock: RwLock<()>,
    version: AtomicU64,
}

impl JsonlRepository {
    pub fn new(config: StorageConfig) -> Self {
        info!("Using JSONL records in {:?}", config.records_dir());
        Self {
            config,
            files_lock: RwLock::new(()),
            version: AtomicU64::new(0),
        }
    }

    fn reader<T: DeserializeOwned>(&self, entity: EntityType) -> JsonlReader<T> {
        JsonlReader::for_entity(&self.config, entity)
    }

    fn writer<T: Serialize>(&self, entity: EntityType) -> JsonlWriter<T> {
        JsonlWriter::for_entity(&self.config, entity)
    }

    fn lock(&self) -> Result<RwLockWriteGuard<'_, ()>, StorageError> {
        self.files_lock.write().map_err(|_| StorageError::LockPoisoned)
    }

    fn shared(&self) -> Result<RwLockReadGuard<'_, ()>, StorageError> {
        self.files_lock.read().map_err(|_| StorageError::LockPoisoned)
    }

    /// Read matching entities while no write is in progress.
    fn read_where<T, F>(&self, entity: EntityType, predicate: F) -> Result<Vec<T>, StorageError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let _guard = self.shared()?;
        self.reader(entity).read_where(predicate)
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Replace the first entity matching `same`, or append it.
    fn replace_or_insert<T, F>(&self, entity: EntityType, item: T, same: F) -> Result<(), StorageError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let _guard = self.lock()?;
        let mut all: Vec<T> = self.reader(entity).read_all()?;
        match all.iter_mut().find(|existing| same(existing)) {
            Some(existing) => *existing = item,
            None => all.push(item),
        }
        self.writer(entity).write_all(&all)?;
        self.bump();
        Ok(())
    }
}

impl ActivityRepository for JsonlRepository {
    fn get_check_ins_for_user(&self, user_id: &UserId) -> Result<Vec<CheckIn>, StorageError> {
        self.read_where(EntityType::CheckIn, |c: &CheckIn| c.user_id == *user_id)
    }

    fn upsert_check_in(&self, check_in: CheckIn) -> Result<CheckIn, StorageError> {
        let user_id = check_in.user_id.clone();
        let date = check_in.date;
        self.replace_or_insert(EntityType::CheckIn, check_in.clone(), |c: &CheckIn| {
            c.user_id == user_id && c.date == date
        })?;
        info!("Stored check-in for {} on {}", user_id, date);
        Ok(check_in)
    }

    fn get_streak_state(&self, user_id: &UserId) -> Result<Option<StreakState>, StorageError> {
        let lines = self.read_where(EntityType::Streak, |s: &StreakLine| s.user_id == *user_id)?;
        Ok(lines.into_iter().next().map(|line| line.state))
    }

    fn save_streak_state(
        &self,
        user_id: &UserId,
        state: &StreakState,
    ) -> Result<(), StorageError> {
        let line = StreakLine {
            user_id: user_id.clone(),
            state: state.clone(),
        };
        self.replace_or_insert(EntityType::Streak, line, |s: &StreakLine| {
            s.user_id == *user_id
        })
    }

    fn get_activity_records_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ActivityRecord>, StorageError> {
        self.read_where(EntityType::Activity, |r: &ActivityRecord| {
            r.user_id == *user_id
        })
    }

    fn append_activity_record(&self, record: &ActivityRecord) -> Result<(), StorageError> {
        let _guard = self.lock()?;
        self.writer(EntityType::Activity).append(record)?;
        self.bump();
        Ok(())
    }

    fn get_challenge(&self, id: &ChallengeId) -> Result<Option<Challenge>, StorageError> {
        let found = self.read_where(EntityType::Challenge, |c: &Challenge| c.id == *id)?;
        Ok(found.into_iter().next())
    }

    fn list_challenges(&self) -> Result<Vec<Challenge>, StorageError> {
        self.read_where(EntityType::Challenge, |_: &Challenge| true)
    }

    fn save_challenge(&self, challenge: &Challenge) -> Result<(), StorageError> {
        self.replace_or_insert(EntityType::Challenge, challenge.clone(), |c: &Challenge| {
            c.id == challenge.id
        })
    }

    fn get_group(&self, id: &GroupId) -> Result<Option<Group>, StorageError> {
        let found = self.read_where(EntityType::Group, |g: &Group| g.id == *id)?;
        Ok(found.into_iter().next())
    }

    fn save_group(&self, group: &Group) -> Result<(), StorageError> {
        self.replace_or_insert(EntityType::Group, group.clone(), |g: &Group| g.id == group.id)
    }

    fn get_scores_for_challenge(&self, id: &ChallengeId) -> Result<Vec<ScoreEntry>, StorageError> {
        self.read_where(EntityType::Score, |s: &ScoreEntry| s.challenge_id == *id)
    }

    fn append_scores(&self, scores: &[ScoreEntry]) -> Result<usize, StorageError> {
        let _guard = self.lock()?;
        let count = self.writer(EntityType::Score).append_batch(scores)?;
        if count > 0 {
            self.bump();
            info!("Stored {} score entries", count);
        }
        Ok(count)
    }

    fn data_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}
