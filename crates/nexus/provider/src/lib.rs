//! Decision provider boundary for the governance loop.
//!
//! A provider receives the current roster and aggregate stats and answers
//! with exactly one of four outcomes: a roster proposal, a decision, a
//! rate-limit signal, or a failure. The loop treats providers as opaque;
//! this crate ships a local random-template provider and an HTTP provider.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod http;
pub mod local;
mod outcome;

use async_trait::async_trait;

pub use error::ProviderError;
pub use http::{HttpDecisionProvider, HttpProviderConfig};
pub use local::LocalDecisionProvider;
pub use outcome::{DecisionOutcome, DecisionRequest, DEFAULT_RATE_LIMIT_WAIT};

/// A source of governance decisions.
///
/// Implementations never return `Err`: every failure is folded into
/// [`DecisionOutcome::Failure`] so call sites handle all four cases in one
/// `match`.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    async fn request_decision(&self, request: &DecisionRequest) -> DecisionOutcome;
}
