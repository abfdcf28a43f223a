//! Leaderboard result cache.
//!
//! Keys include the repository's data version, so any write makes every
//! older key unreachable. Stale entries are pruned on the next insert and
//! the least recently used leaderboard is evicted once the cache is full.

use std::num::NonZeroUsize;

use chrono::{DateTime, Duration, DurationRound, Utc};
use lru::LruCache;
use tracing::debug;

use crate::config::CacheConfig;
use crate::models::{DateWindow, LeaderboardRow, Metric, Window};

/// What a leaderboard ranks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaderboardScope {
    Group,
    Challenge,
    League,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scope: LeaderboardScope,
    pub id: String,
    pub metric: Option<Metric>,
    pub window: Option<Window>,
    /// Resolved window start; keeps "this week" from outliving the week
    pub window_start: Option<DateTime<Utc>>,
    /// Resolved window end to the minute; moves with `now` for `all`
    pub window_end: Option<DateTime<Utc>>,
    pub data_version: u64,
}

impl CacheKey {
    /// Key for a score-based leaderboard (challenge or league).
    pub fn scores(scope: LeaderboardScope, id: &str, data_version: u64) -> Self {
        Self {
            scope,
            id: id.to_string(),
            metric: None,
            window: None,
            window_start: None,
            window_end: None,
            data_version,
        }
    }

    /// Key for a group metric leaderboard over resolved `bounds`.
    pub fn group(
        id: &str,
        metric: Metric,
        window: Window,
        bounds: &DateWindow,
        data_version: u64,
    ) -> Self {
        let end = bounds
            .end
            .duration_trunc(Duration::minutes(1))
            .unwrap_or(bounds.end);
        Self {
            scope: LeaderboardScope::Group,
            id: id.to_string(),
            metric: Some(metric),
            window: Some(window),
            window_start: Some(bounds.start),
            window_end: Some(end),
            data_version,
        }
    }
}

/// LRU-bounded map of computed leaderboards.
pub struct LeaderboardCache {
    enabled: bool,
    entries: LruCache<CacheKey, Vec<LeaderboardRow>>,
}

impl LeaderboardCache {
    /// Capacity used when the configured size is zero
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
        Some(n) => n,
        None => unreachable!(),
    };

    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        Self {
            enabled: config.enabled,
            entries: LruCache::new(capacity),
        }
    }

    /// Look up a leaderboard, marking it recently used.
    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<LeaderboardRow>> {
        if !self.enabled {
            return None;
        }
        let hit = self.entries.get(key).cloned();
        if hit.is_some() {
            debug!("Leaderboard cache hit for {:?} {}", key.scope, key.id);
        }
        hit
    }

    pub fn insert(&mut self, key: CacheKey, rows: Vec<LeaderboardRow>) {
        if !self.enabled {
            return;
        }

        let version = key.data_version;
        let stale: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(k, _)| k.data_version < version)
            .map(|(k, _)| k.clone())
            .collect();
        for k in &stale {
            self.entries.pop(k);
        }
        if !stale.is_empty() {
            debug!("Pruned {} stale leaderboards", stale.len());
        }

        self.entries.put(key, rows);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
