//! Local random-template provider.
//!
//! Stands in for a remote reasoning backend: no quota, no network. It picks
//! a random worker, a random signed delta, and fills text templates.

use crate::{DecisionOutcome, DecisionProvider, DecisionRequest};
use async_trait::async_trait;
use nexus_types::{Decision, ProposedWorker, RosterProposal, WorkerId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

const DEFAULT_THINK_DELAY: Duration = Duration::from_millis(1500);
const ROSTER_SIZE: usize = 10;

const MONOLOGUE_TEMPLATES: &[&str] = &[
    "Coordinate analysis of {worker} shows 98% alignment with the charter. Holding the standard is the heart of prosperity.",
    "Node sensors around {worker} report a drop in activity. Ignoring the numbers is refusing the reward, intervention follows.",
    "Figures reported by {worker} drift from the ledger. Discipline is applied to keep the arena honest.",
    "{worker} is asking for positive energy, but order comes before comfort. The outcome is stability.",
    "Signal noise detected in the {worker} sector. Allocation is being corrected.",
];

const DIRECTIVE_TEMPLATES: &[&str] = &[
    "SOVEREIGN_REWARD_ALPHA: grant +{amount} SP as a model of integrity",
    "SYSTEM_PURGE_SIGMA: deduct {amount} SP for breaching the timing rules",
    "ARENA_BOOST_OMEGA: promote to temporary MVP to lift output",
    "DISCIPLINARY_PULSE: send a critical notice to every rest-point terminal",
    "GOLDEN_LUCK_SYNC: route bonus points to the most diligent line this second",
];

const ACTIONS: &[&str] = &[
    "ENFORCE_CONSTITUTION",
    "BOOST_PRODUCTIVITY",
    "PUNISH_IDLE_TIME",
    "AWARD_LOYALTY",
    "SYNC_GOVERNANCE",
];

const ROSTER_NAMES: &[&str] = &[
    "Somchai", "Malee", "Niran", "Kanya", "Prasert", "Suda", "Anan", "Pimchanok", "Chaiwat",
    "Ratana",
];

/// Provider that fabricates decisions locally
pub struct LocalDecisionProvider {
    think_delay: Duration,
    rng: Mutex<StdRng>,
}

impl Default for LocalDecisionProvider {
    fn default() -> Self {
        Self::new(DEFAULT_THINK_DELAY)
    }
}

impl LocalDecisionProvider {
    pub fn new(think_delay: Duration) -> Self {
        Self {
            think_delay,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic provider for tests and replays.
    pub fn with_seed(think_delay: Duration, seed: u64) -> Self {
        Self {
            think_delay,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn propose_roster(&self) -> RosterProposal {
        let workers = ROSTER_NAMES
            .iter()
            .take(ROSTER_SIZE)
            .enumerate()
            .map(|(idx, name)| ProposedWorker {
                id: WorkerId::new(format!("NODE-{:03}", idx + 1)),
                name: (*name).to_string(),
                activity_points: 0,
                notes: String::new(),
            })
            .collect();

        RosterProposal {
            workers,
            monologue: "Roster is empty. Provisioning the initial fleet.".to_string(),
            directive: "FLEET_GENESIS".to_string(),
        }
    }

    fn decide(&self, request: &DecisionRequest) -> Option<Decision> {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let worker = request.workers.choose(&mut *rng)?;
        let amount: i64 = if rng.gen_bool(0.5) {
            1500 + rng.gen_range(0..2000)
        } else {
            -(800 + rng.gen_range(0..1200))
        };

        let monologue = MONOLOGUE_TEMPLATES
            .choose(&mut *rng)
            .copied()
            .unwrap_or_default()
            .replace("{worker}", &worker.name);
        let directive = DIRECTIVE_TEMPLATES
            .choose(&mut *rng)
            .copied()
            .unwrap_or_default()
            .replace("{amount}", &amount.unsigned_abs().to_string());
        let action = ACTIONS.choose(&mut *rng).copied().unwrap_or_default();

        Some(Decision {
            monologue,
            directive,
            action: action.to_string(),
            target_worker_id: Some(worker.id.clone()),
            sp_change: Some(amount),
        })
    }
}

#[async_trait]
impl DecisionProvider for LocalDecisionProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn request_decision(&self, request: &DecisionRequest) -> DecisionOutcome {
        if !self.think_delay.is_zero() {
            tokio::time::sleep(self.think_delay).await;
        }

        if request.workers.is_empty() {
            return DecisionOutcome::Initialization(self.propose_roster());
        }

        match self.decide(request) {
            Some(decision) => DecisionOutcome::Decision(decision),
            None => DecisionOutcome::Failure(crate::ProviderError::Empty),
        }
    }
}
