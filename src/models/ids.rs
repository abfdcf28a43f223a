//! Opaque string identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An entity identifier.
///
/// Users, groups and challenges carry ids assigned by whoever created them;
/// records produced by this crate (score entries, activity records) get a
/// random v4 UUID so that concurrent writers never collide.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from an existing string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generate a fresh collision-resistant id with a readable prefix,
    /// e.g. `score_6f1c...`.
    pub fn random(prefix: &str) -> Self {
        Self(format!("{}_{}", prefix, Uuid::new_v4().simple()))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for user IDs
pub type UserId = EntityId;

/// Type alias for group IDs
pub type GroupId = EntityId;

/// Type alias for challenge IDs
pub type ChallengeId = EntityId;

/// Type alias for league IDs
pub type LeagueId = EntityId;

/// Type alias for score entry IDs
pub type ScoreEntryId = EntityId;

/// Type alias for activity record IDs
pub type ActivityId = EntityId;
