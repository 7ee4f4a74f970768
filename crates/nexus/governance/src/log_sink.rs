//! Operator log feed

use nexus_types::{LogEntry, LogFeed, LogSeverity};
use std::sync::Mutex;
use tokio::sync::broadcast;

const BROADCAST_CAPACITY: usize = 256;

/// Bounded log feed mirrored to `tracing` and broadcast to subscribers
#[derive(Debug)]
pub struct LogSink {
    feed: Mutex<LogFeed>,
    tx: broadcast::Sender<LogEntry>,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            feed: Mutex::new(LogFeed::with_capacity(capacity)),
            tx,
        }
    }

    pub fn add_log(&self, message: impl Into<String>, severity: LogSeverity) -> LogEntry {
        let entry = LogEntry::new(message, severity);

        match severity {
            LogSeverity::Info => tracing::info!(target: "nexus::feed", "{}", entry.message),
            LogSeverity::Warning => tracing::warn!(target: "nexus::feed", "{}", entry.message),
            LogSeverity::Critical => tracing::error!(target: "nexus::feed", "{}", entry.message),
        }

        self.feed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry.clone());

        // No subscribers is fine
        let _ = self.tx.send(entry.clone());
        entry
    }

    /// Most recent entries first.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.feed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .recent(limit)
    }

    pub fn len(&self) -> usize {
        self.feed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }
}
