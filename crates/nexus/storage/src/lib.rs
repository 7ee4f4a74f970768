//! Nexus snapshot persistence.
//!
//! The governance loop persists three independently keyed JSON blobs after
//! every mutation: the worker roster, the audit log, and the aggregate
//! system state. This crate defines:
//! - a minimal async key-value contract
//! - an in-memory backend for tests and ephemeral runs
//! - a file backend that keeps one JSON file per key
//! - snapshot load/save with per-key fallback to defaults

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod file;
pub mod memory;
mod snapshot;
mod traits;

pub use error::{StorageError, StorageResult};
pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use snapshot::{
    load_snapshot, save_snapshot, GovernanceSnapshot, AUDIT_KEY, SYSTEM_KEY, WORKERS_KEY,
};
pub use traits::KeyValueStore;
