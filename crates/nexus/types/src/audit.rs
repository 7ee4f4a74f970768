//! Append-only audit journal of point adjustments

use crate::ids::{AuditEntryId, WorkerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Default number of entries kept in the visible audit window
pub const DEFAULT_AUDIT_CAPACITY: usize = 100;

/// Category of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    Reward,
    Penalty,
    System,
}

impl AuditKind {
    /// Kind implied by the sign of a delta: zero counts as a reward.
    pub fn for_delta(delta: i64) -> Self {
        if delta >= 0 {
            AuditKind::Reward
        } else {
            AuditKind::Penalty
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditKind::Reward => write!(f, "REWARD"),
            AuditKind::Penalty => write!(f, "PENALTY"),
            AuditKind::System => write!(f, "SYSTEM"),
        }
    }
}

/// An immutable record of one point adjustment.
///
/// The worker name is denormalized so the entry stays readable even if the
/// roster is later replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub timestamp: DateTime<Utc>,
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub kind: AuditKind,
    pub amount: i64,
    pub reason: String,
}

impl AuditEntry {
    pub fn new(
        worker_id: WorkerId,
        worker_name: impl Into<String>,
        kind: AuditKind,
        amount: i64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditEntryId::generate(),
            timestamp: Utc::now(),
            worker_id,
            worker_name: worker_name.into(),
            kind,
            amount,
            reason: reason.into(),
        }
    }
}

/// Bounded audit window, most recent entry first.
///
/// Serializes as a plain JSON array in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AuditEntry>", into = "Vec<AuditEntry>")]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend an entry, dropping the oldest ones past the cap.
    pub fn push(&mut self, entry: AuditEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Change the cap; shrinking discards the oldest entries.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.entries.truncate(self.capacity);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<&AuditEntry> {
        self.entries.front()
    }

    /// Entries in display order (most recent first).
    pub fn iter(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }
}

impl From<Vec<AuditEntry>> for AuditLog {
    fn from(entries: Vec<AuditEntry>) -> Self {
        let capacity = entries.len().max(DEFAULT_AUDIT_CAPACITY);
        Self {
            entries: entries.into(),
            capacity,
        }
    }
}

impl From<AuditLog> for Vec<AuditEntry> {
    fn from(log: AuditLog) -> Self {
        log.entries.into()
    }
}
