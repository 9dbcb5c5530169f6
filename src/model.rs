//! Core data model.
//!
//! A queue is the set of open merge requests assigned to the automation user
//! within one project. A snapshot is the part of a queue that change
//! detection looks at: which items, in which order, assigned when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Queue identity
// ---------------------------------------------------------------------------

/// Newtype for queue (GitLab project) IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(pub u64);

impl std::fmt::Display for QueueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for QueueId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(QueueId)
    }
}

/// The user on whose behalf assigned items are queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: u64,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Queue Item
// ---------------------------------------------------------------------------

/// One open merge request assigned to the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Project-scoped identifier, shown as `!<id>`.
    pub id: u64,
    pub title: String,
    pub url: String,
    /// When the item was assigned to the actor.
    pub assigned_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One `(id, assigned_at)` pair of a snapshot, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: u64,
    /// Epoch seconds.
    pub assigned_at: i64,
}

/// Comparable state of a queue. Equality is element-wise and order-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub Vec<SnapshotEntry>);

impl Snapshot {
    /// Build a snapshot from fetched items, keeping fetch order.
    pub fn from_items(items: &[QueueItem]) -> Self {
        items
            .iter()
            .map(|item| SnapshotEntry {
                id: item.id,
                assigned_at: item.assigned_at.timestamp(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.0
    }
}

impl FromIterator<SnapshotEntry> for Snapshot {
    fn from_iter<I: IntoIterator<Item = SnapshotEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
