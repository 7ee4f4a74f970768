//! Bounded operator log feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Default number of log lines kept in the feed
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Display severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSeverity::Info => write!(f, "info"),
            LogSeverity::Warning => write!(f, "warning"),
            LogSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// One line of the operator feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: LogSeverity,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, severity: LogSeverity) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            severity,
        }
    }
}

/// Most-recent-first log window
#[derive(Debug, Clone)]
pub struct LogFeed {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl LogFeed {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }
}
