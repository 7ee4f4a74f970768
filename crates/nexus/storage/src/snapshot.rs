//! Snapshot of the persisted governance state

use crate::traits::KeyValueStore;
use crate::StorageResult;
use nexus_types::{AuditLog, KernelPhase, SystemState, Worker};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Key of the worker roster blob (JSON array)
pub const WORKERS_KEY: &str = "nexus.workers";
/// Key of the audit log blob (JSON array, most recent first)
pub const AUDIT_KEY: &str = "nexus.audit";
/// Key of the aggregate system state blob (JSON object)
pub const SYSTEM_KEY: &str = "nexus.system";

/// Everything the governance loop persists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GovernanceSnapshot {
    pub workers: Vec<Worker>,
    pub audit: AuditLog,
    pub system: SystemState,
}

impl GovernanceSnapshot {
    /// Empty roster and audit log around a seeded system state.
    pub fn seeded(sovereign_seed: i64) -> Self {
        Self {
            workers: Vec::new(),
            audit: AuditLog::default(),
            system: SystemState::seeded(sovereign_seed),
        }
    }

    pub fn worker(&self, id: &nexus_types::WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|w| &w.id == id)
    }

    pub fn worker_mut(&mut self, id: &nexus_types::WorkerId) -> Option<&mut Worker> {
        self.workers.iter_mut().find(|w| &w.id == id)
    }
}

/// Rehydrate a snapshot.
///
/// Each blob is read independently; a missing, unreadable, or unparsable
/// blob falls back to its default and is logged. The kernel phase always
/// restarts at `INITIALIZING`.
pub async fn load_snapshot(store: &dyn KeyValueStore, sovereign_seed: i64) -> GovernanceSnapshot {
    let defaults = GovernanceSnapshot::seeded(sovereign_seed);

    let workers = load_blob(store, WORKERS_KEY)
        .await
        .unwrap_or(defaults.workers);
    let audit = load_blob(store, AUDIT_KEY).await.unwrap_or(defaults.audit);
    let mut system: SystemState = load_blob(store, SYSTEM_KEY)
        .await
        .unwrap_or(defaults.system);
    system.kernel = KernelPhase::Initializing;

    GovernanceSnapshot {
        workers,
        audit,
        system,
    }
}

async fn load_blob<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key, "No persisted blob, using default");
            return None;
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "Failed to read persisted blob, using default");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "Persisted blob is unparsable, using default");
            None
        }
    }
}

/// Write all three blobs.
///
/// Everything is serialized before the first write so an encoding failure
/// never leaves a partially updated store.
pub async fn save_snapshot(
    store: &dyn KeyValueStore,
    snapshot: &GovernanceSnapshot,
) -> StorageResult<()> {
    let workers = serde_json::to_string(&snapshot.workers)?;
    let audit = serde_json::to_string(&snapshot.audit)?;
    let system = serde_json::to_string(&snapshot.system)?;

    store.put(WORKERS_KEY, workers).await?;
    store.put(AUDIT_KEY, audit).await?;
    store.put(SYSTEM_KEY, system).await?;
    Ok(())
}
