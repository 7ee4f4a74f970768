//! The governance context: every piece of mutable loop state in one place.
//!
//! Methods here are synchronous and side-effect free apart from mutating
//! `self`; locking, logging, and persistence belong to the loop.

use crate::GovernanceError;
use nexus_provider::DecisionRequest;
use nexus_storage::GovernanceSnapshot;
use nexus_types::{
    AuditEntry, AuditKind, Decision, KernelPhase, RosterProposal, SystemState, Thought, Worker,
    WorkerId, WorkerStatus,
};
use std::time::Duration;

/// Result of applying a provider decision to a known worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDecision {
    pub worker_id: WorkerId,
    pub action: String,
    pub delta: i64,
    pub new_points: u64,
    pub entry: AuditEntry,
}

/// What one clock advance changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ClockStep {
    pub seconds: u64,
    pub cooldown_cleared: bool,
}

/// Mutable state of one governance loop
#[derive(Debug, Clone)]
pub struct GovernanceContext {
    pub(crate) snapshot: GovernanceSnapshot,
    pub(crate) thought: Option<Thought>,
    /// Whole seconds left in the cooldown window; zero when inactive.
    pub(crate) cooldown_secs: u64,
    /// Clock time not yet folded into whole seconds.
    pub(crate) clock_carry: Duration,
    pub(crate) active: bool,
    /// Bumped on every activation change; results from an older epoch are stale.
    pub(crate) epoch: u64,
    /// Bumped on every started cycle; guards the display-hold revert.
    pub(crate) cycle_seq: u64,
    pub(crate) booted: bool,
}

impl GovernanceContext {
    pub fn new(mut snapshot: GovernanceSnapshot, audit_capacity: usize) -> Self {
        snapshot.audit.set_capacity(audit_capacity);
        Self {
            snapshot,
            thought: None,
            cooldown_secs: 0,
            clock_carry: Duration::ZERO,
            active: false,
            epoch: 0,
            cycle_seq: 0,
            booted: false,
        }
    }

    pub fn snapshot(&self) -> &GovernanceSnapshot {
        &self.snapshot
    }

    pub fn system(&self) -> &SystemState {
        &self.snapshot.system
    }

    pub fn workers(&self) -> &[Worker] {
        &self.snapshot.workers
    }

    pub fn thought(&self) -> Option<&Thought> {
        self.thought.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cooldown_remaining(&self) -> Option<Duration> {
        (self.cooldown_secs > 0).then(|| Duration::from_secs(self.cooldown_secs))
    }

    pub(crate) fn set_phase(&mut self, phase: KernelPhase) {
        self.snapshot.system.kernel = phase;
    }

    /// `TotalSP: <total>, AnomalyCount: <audit entries>`
    pub fn stats_line(&self) -> String {
        format!(
            "TotalSP: {}, AnomalyCount: {}",
            self.snapshot.system.sovereign_points,
            self.snapshot.audit.len()
        )
    }

    pub fn build_request(&self) -> DecisionRequest {
        let workers = self.snapshot.workers.iter().map(Worker::summary).collect();
        DecisionRequest::new(workers, self.stats_line())
    }

    /// Start a cooldown window and return its length in whole seconds.
    ///
    /// The wait is rounded up; a missing or zero wait uses `default`.
    pub(crate) fn enter_cooldown(&mut self, wait: Option<Duration>, default: Duration) -> u64 {
        let wait = wait.filter(|w| !w.is_zero()).unwrap_or(default);
        let secs = ceil_secs(wait).max(1);
        self.cooldown_secs = secs;
        secs
    }

    /// Advance the clock by `elapsed` wall time.
    ///
    /// Only whole seconds move uptime and the cooldown; the remainder is
    /// carried into the next call.
    pub(crate) fn advance_clock(&mut self, elapsed: Duration) -> ClockStep {
        let total = self.clock_carry.saturating_add(elapsed);
        let seconds = total.as_secs();
        self.clock_carry = total - Duration::from_secs(seconds);

        if seconds == 0 {
            return ClockStep::default();
        }
        self.snapshot.system.advance_uptime(seconds);

        let cooling = self.cooldown_secs > 0;
        self.cooldown_secs = self.cooldown_secs.saturating_sub(seconds);
        ClockStep {
            seconds,
            cooldown_cleared: cooling && self.cooldown_secs == 0,
        }
    }

    /// Replace an empty roster with a provider proposal.
    ///
    /// Returns the number of workers provisioned, or `None` when a roster
    /// already exists and the proposal is ignored.
    pub(crate) fn provision_roster(
        &mut self,
        proposal: RosterProposal,
        roster_cap: usize,
        starting_points: u64,
    ) -> Option<usize> {
        if !self.snapshot.workers.is_empty() {
            return None;
        }

        let mut seen = std::collections::HashSet::new();
        self.snapshot.workers = proposal
            .workers
            .into_iter()
            .filter(|proposed| seen.insert(proposed.id.clone()))
            .take(roster_cap)
            .map(|proposed| {
                let mut worker = Worker::new(proposed.id, proposed.name, starting_points);
                worker.activity_points = proposed.activity_points;
                worker.notes = proposed.notes;
                worker
            })
            .collect();
        Some(self.snapshot.workers.len())
    }

    /// Apply a decision to its target.
    ///
    /// Returns `None` without touching anything when the decision names no
    /// worker or a worker that is not on the roster. A missing delta counts
    /// as zero.
    pub(crate) fn apply_decision(&mut self, decision: &Decision) -> Option<AppliedDecision> {
        let target = decision.target_worker_id.as_ref()?;
        let delta = decision.sp_change.unwrap_or(0);

        let worker = self.snapshot.worker_mut(target)?;
        let new_points = worker.adjust_points(delta);
        if delta < 0 {
            worker.status = WorkerStatus::Warning;
        } else if delta > 0 {
            worker.status = WorkerStatus::Active;
        }

        let entry = AuditEntry::new(
            worker.id.clone(),
            worker.name.clone(),
            AuditKind::for_delta(delta),
            delta,
            decision.monologue.clone(),
        );

        self.thought = Some(Thought::from_decision(decision));
        self.snapshot.audit.push(entry.clone());
        self.snapshot.system.record_directive(delta);

        Some(AppliedDecision {
            worker_id: target.clone(),
            action: decision.action.clone(),
            delta,
            new_points,
            entry,
        })
    }

    /// Deduct a manual penalty from a worker.
    pub(crate) fn apply_penalty(
        &mut self,
        worker_id: &WorkerId,
        violation: &str,
        penalty: u64,
    ) -> Result<AuditEntry, GovernanceError> {
        let worker = self
            .snapshot
            .worker_mut(worker_id)
            .ok_or_else(|| GovernanceError::UnknownWorker(worker_id.clone()))?;

        let amount = -i64::try_from(penalty).unwrap_or(i64::MAX);
        worker.adjust_points(amount);
        worker.status = WorkerStatus::Warning;

        let entry = AuditEntry::new(
            worker.id.clone(),
            worker.name.clone(),
            AuditKind::Penalty,
            amount,
            violation,
        );
        self.snapshot.audit.push(entry.clone());
        self.snapshot.system.record_delta(amount);
        Ok(entry)
    }
}

fn ceil_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs();
    if wait.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}
