//! Decisions produced by a provider and the thought surfaced to operators

use crate::ids::{ThoughtId, WorkerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One governance decision.
///
/// Any signed delta is accepted; nothing ties the narrative text to the sign
/// or the magnitude of `sp_change`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub monologue: String,
    pub directive: String,
    pub action: String,
    #[serde(default, alias = "targetWorkerId")]
    pub target_worker_id: Option<WorkerId>,
    #[serde(default, alias = "spChange")]
    pub sp_change: Option<i64>,
}

/// A worker proposed by the provider when the roster is empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedWorker {
    pub id: WorkerId,
    pub name: String,
    #[serde(default)]
    pub activity_points: u64,
    #[serde(default)]
    pub notes: String,
}

/// Initial roster proposal returned on first run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterProposal {
    pub workers: Vec<ProposedWorker>,
    #[serde(default)]
    pub monologue: String,
    #[serde(default)]
    pub directive: String,
}

/// The "current thought" held for display after a decision is applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
    pub id: ThoughtId,
    pub timestamp: DateTime<Utc>,
    pub monologue: String,
    pub directive: String,
    pub action: String,
    pub target_worker_id: Option<WorkerId>,
    pub sp_change: Option<i64>,
}

impl Thought {
    pub fn from_decision(decision: &Decision) -> Self {
        Self {
            id: ThoughtId::generate(),
            timestamp: Utc::now(),
            monologue: decision.monologue.clone(),
            directive: decision.directive.clone(),
            action: decision.action.clone(),
            target_worker_id: decision.target_worker_id.clone(),
            sp_change: decision.sp_change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_accepts_camel_case_aliases() {
        let decision: Decision = serde_json::from_str(
            r#"{"monologue":"m","directive":"d","action":"a","targetWorkerId":"NODE-003","spChange":-1200}"#,
        )
        .unwrap();
        assert_eq!(decision.target_worker_id, Some(WorkerId::new("NODE-003")));
        assert_eq!(decision.sp_change, Some(-1200));
    }

    #[test]
    fn decision_target_and_delta_are_optional() {
        let decision: Decision =
            serde_json::from_str(r#"{"monologue":"m","directive":"d","action":"a"}"#).unwrap();
        assert!(decision.target_worker_id.is_none());
        assert!(decision.sp_change.is_none());
    }
}
