//! Sovereign Nexus core types
//!
//! This crate defines the data model shared by the governance loop:
//! - worker roster entries and their scores
//! - the bounded, most-recent-first audit log
//! - aggregate system state and kernel phase
//! - decisions and the "current thought" surfaced to operators
//! - the bounded log feed

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod audit;
pub mod decision;
pub mod ids;
pub mod log;
pub mod system;
pub mod worker;

pub use audit::{AuditEntry, AuditKind, AuditLog, DEFAULT_AUDIT_CAPACITY};
pub use decision::{Decision, ProposedWorker, RosterProposal, Thought};
pub use ids::{AuditEntryId, ThoughtId, WorkerId};
pub use log::{LogEntry, LogFeed, LogSeverity, DEFAULT_LOG_CAPACITY};
pub use system::{KernelPhase, SystemState, DEFAULT_SOVEREIGN_SEED};
pub use worker::{apply_delta, Rank, Worker, WorkerStatus, WorkerSummary};
