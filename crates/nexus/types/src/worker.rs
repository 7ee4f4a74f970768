//! Worker roster types

use crate::ids::WorkerId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Worker rank, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Rank {
    #[default]
    Silver,
    Gold,
    Diamond,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Silver => write!(f, "Silver"),
            Rank::Gold => write!(f, "Gold"),
            Rank::Diamond => write!(f, "Diamond"),
        }
    }
}

/// Standing of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkerStatus {
    #[default]
    Active,
    Warning,
    Suspended,
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStatus::Active => write!(f, "Active"),
            WorkerStatus::Warning => write!(f, "Warning"),
            WorkerStatus::Suspended => write!(f, "Suspended"),
        }
    }
}

/// A worker on the roster.
///
/// `sovereign_points` is the asset score adjusted by decisions and manual
/// audits; it never drops below zero. `activity_points` is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    #[serde(default)]
    pub activity_points: u64,
    pub sovereign_points: u64,
    #[serde(default)]
    pub rank: Rank,
    #[serde(default)]
    pub status: WorkerStatus,
    #[serde(default)]
    pub notes: String,
}

impl Worker {
    pub fn new(id: impl Into<WorkerId>, name: impl Into<String>, sovereign_points: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            activity_points: 0,
            sovereign_points,
            rank: Rank::default(),
            status: WorkerStatus::default(),
            notes: String::new(),
        }
    }

    /// Apply a signed delta to the asset score, flooring at zero.
    ///
    /// Returns the resulting score.
    pub fn adjust_points(&mut self, delta: i64) -> u64 {
        self.sovereign_points = apply_delta(self.sovereign_points, delta);
        self.sovereign_points
    }

    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            activity_points: self.activity_points,
            sovereign_points: self.sovereign_points,
        }
    }
}

/// `max(0, score + delta)` without overflow.
pub fn apply_delta(score: u64, delta: i64) -> u64 {
    if delta >= 0 {
        score.saturating_add(delta.unsigned_abs())
    } else {
        score.saturating_sub(delta.unsigned_abs())
    }
}

/// Provider-facing projection of a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub id: WorkerId,
    pub name: String,
    pub activity_points: u64,
    pub sovereign_points: u64,
}
