//! Sovereign Nexus governance loop.
//!
//! The loop periodically asks a [`DecisionProvider`](nexus_provider::DecisionProvider)
//! for a decision, applies it to the worker roster, journals it in the audit
//! log, and persists a snapshot after every mutation. A rate-limit answer
//! suspends cycles for a cooldown window counted down in whole seconds of
//! wall time by a background clock.
//!
//! All mutable state lives in one [`GovernanceContext`] behind an async
//! mutex; the provider call is the only await point in a cycle that runs
//! without the lock held.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

pub mod config;
mod context;
mod engine;
mod error;
mod log_sink;
mod penalty;
mod task;

pub use config::GovernanceConfig;
pub use context::{AppliedDecision, GovernanceContext};
pub use engine::{CycleOutcome, GovernanceLoop, LoopStatus, SkipReason, TickerMessage};
pub use error::GovernanceError;
pub use log_sink::LogSink;
pub use penalty::{parse_penalty, DEFAULT_MANUAL_PENALTY, MAX_PENALTY};
pub use task::{RepeatingTask, TaskHandle};
