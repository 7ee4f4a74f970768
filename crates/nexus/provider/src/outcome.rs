use crate::error::ProviderError;
use nexus_types::{Decision, RosterProposal, WorkerSummary};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wait applied when a rate-limit signal carries no suggestion
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(120);

/// Provider-agnostic request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub workers: Vec<WorkerSummary>,
    pub stats: String,
}

impl DecisionRequest {
    pub fn new(workers: Vec<WorkerSummary>, stats: impl Into<String>) -> Self {
        Self {
            workers,
            stats: stats.into(),
        }
    }
}

/// Everything a provider can answer with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// First-run roster proposal.
    Initialization(RosterProposal),
    Decision(Decision),
    /// The backend asked us to back off; `None` means no suggested wait.
    RateLimited { retry_after: Option<Duration> },
    Failure(ProviderError),
}

impl DecisionOutcome {
    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        DecisionOutcome::RateLimited { retry_after }
    }

    /// Short tag for logs.
    pub fn label(&self) -> &'static str {
        match self {
            DecisionOutcome::Initialization(_) => "initialization",
            DecisionOutcome::Decision(_) => "decision",
            DecisionOutcome::RateLimited { .. } => "rate_limited",
            DecisionOutcome::Failure(_) => "failure",
        }
    }
}
