//! Error types for the governance loop

use nexus_storage::StorageError;
use nexus_types::WorkerId;
use thiserror::Error;

/// Errors surfaced by the governance loop's caller-facing operations.
///
/// Cycle failures never appear here; they degrade to "no change this
/// cycle" and are reported through the log feed.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Unknown worker: {0}")]
    UnknownWorker(WorkerId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
