//! Behavioural tests of the governance loop against a scripted provider.

use async_trait::async_trait;
use nexus_governance::{
    CycleOutcome, GovernanceConfig, GovernanceError, GovernanceLoop, SkipReason, MAX_PENALTY,
};
use nexus_provider::{
    DecisionOutcome, DecisionProvider, DecisionRequest, LocalDecisionProvider, ProviderError,
};
use nexus_storage::{load_snapshot, GovernanceSnapshot, InMemoryKeyValueStore, KeyValueStore};
use nexus_types::{
    AuditKind, Decision, KernelPhase, LogSeverity, ProposedWorker, RosterProposal, Worker,
    WorkerId, WorkerStatus, DEFAULT_SOVEREIGN_SEED,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays a fixed list of outcomes, then fails with `Empty`.
struct ScriptedProvider {
    script: Mutex<VecDeque<DecisionOutcome>>,
    requests: Mutex<Vec<DecisionRequest>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedProvider {
    fn new(script: Vec<DecisionOutcome>) -> Arc<Self> {
        Self::delayed(script, Duration::ZERO)
    }

    fn delayed(script: Vec<DecisionOutcome>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> Option<DecisionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl DecisionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn request_decision(&self, request: &DecisionRequest) -> DecisionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DecisionOutcome::Failure(ProviderError::Empty))
    }
}

fn decision(target: &str, delta: i64) -> DecisionOutcome {
    DecisionOutcome::Decision(Decision {
        monologue: format!("adjusting {}", target),
        directive: "SYNC".to_string(),
        action: "ENFORCE_CONSTITUTION".to_string(),
        target_worker_id: Some(WorkerId::new(target)),
        sp_change: Some(delta),
    })
}

fn test_config() -> GovernanceConfig {
    GovernanceConfig {
        display_hold_ms: 0,
        auto_activate: false,
        ..GovernanceConfig::default()
    }
}

fn roster() -> GovernanceSnapshot {
    let mut snapshot = GovernanceSnapshot::seeded(DEFAULT_SOVEREIGN_SEED);
    snapshot.workers = vec![
        Worker::new("NODE-001", "Somchai", 5000),
        Worker::new("NODE-002", "Malee", 300),
        Worker::new("NODE-003", "Niran", 4000),
    ];
    snapshot
}

struct Harness {
    nexus: GovernanceLoop,
    provider: Arc<ScriptedProvider>,
    store: Arc<InMemoryKeyValueStore>,
}

fn harness(
    config: GovernanceConfig,
    snapshot: GovernanceSnapshot,
    provider: Arc<ScriptedProvider>,
) -> Harness {
    let store = Arc::new(InMemoryKeyValueStore::new());
    let nexus = GovernanceLoop::new(config, provider.clone(), store.clone(), snapshot);
    Harness {
        nexus,
        provider,
        store,
    }
}

/// Activate and let the immediate first cycle run.
async fn activate(nexus: &GovernanceLoop) {
    assert!(nexus.activate().await);
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn penalty_decision_is_applied_journaled_and_totalled() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::new(vec![decision("NODE-003", -1200)]),
    );
    activate(&h.nexus).await;

    let workers = h.nexus.workers().await;
    let niran = workers.iter().find(|w| w.id.as_str() == "NODE-003").unwrap();
    assert_eq!(niran.sovereign_points, 2800);
    assert_eq!(niran.status, WorkerStatus::Warning);

    let audit = h.nexus.audit(10).await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].kind, AuditKind::Penalty);
    assert_eq!(audit[0].amount, -1200);
    assert_eq!(audit[0].worker_name, "Niran");

    let state = h.nexus.system_state().await;
    assert_eq!(state.sovereign_points, DEFAULT_SOVEREIGN_SEED - 1200);
    assert_eq!(state.total_directives, 1);
    assert_eq!(state.kernel, KernelPhase::Stable);

    let thought = h.nexus.thought().await.unwrap();
    assert_eq!(thought.sp_change, Some(-1200));

    let logs = h.nexus.logs().recent(10);
    assert!(logs.iter().any(|l| l.severity == LogSeverity::Critical
        && l.message == ">>> [AGENT_DECREE] ENFORCE_CONSTITUTION ON NODE-003: -1200 SP"));
}

#[tokio::test(start_paused = true)]
async fn request_carries_roster_summary_and_stats() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::new(vec![decision("NODE-001", 100)]),
    );
    activate(&h.nexus).await;
    assert_eq!(h.nexus.run_cycle().await, CycleOutcome::Failed {
        error: ProviderError::Empty.to_string()
    });

    let request = h.provider.last_request().unwrap();
    assert_eq!(request.workers.len(), 3);
    assert_eq!(request.workers[1].sovereign_points, 300);
    assert_eq!(request.stats, "TotalSP: 2450100, AnomalyCount: 1");
}

#[tokio::test(start_paused = true)]
async fn scores_floor_at_zero_and_total_tracks_every_delta() {
    let deltas = [-1000, 2500, -99_999, 1500, -200];
    let script = deltas.iter().map(|d| decision("NODE-002", *d)).collect();
    let h = harness(test_config(), roster(), ScriptedProvider::new(script));
    activate(&h.nexus).await;
    for _ in 1..deltas.len() {
        assert!(h.nexus.run_cycle().await.mutated());
    }

    let mut expected = 300u64;
    for delta in deltas {
        expected = if delta < 0 {
            expected.saturating_sub(delta.unsigned_abs())
        } else {
            expected + delta as u64
        };
    }
    let workers = h.nexus.workers().await;
    assert_eq!(workers[1].sovereign_points, expected);

    let state = h.nexus.system_state().await;
    assert_eq!(
        state.sovereign_points,
        DEFAULT_SOVEREIGN_SEED + deltas.iter().sum::<i64>()
    );
    assert_eq!(state.total_directives, deltas.len() as u64);
}

#[tokio::test(start_paused = true)]
async fn audit_log_is_most_recent_first_and_bounded() {
    let config = GovernanceConfig {
        audit_capacity: 3,
        ..test_config()
    };
    let script = (1..=5).map(|n| decision("NODE-001", n * 10)).collect();
    let h = harness(config, roster(), ScriptedProvider::new(script));
    activate(&h.nexus).await;
    for _ in 0..4 {
        h.nexus.run_cycle().await;
    }

    let amounts: Vec<i64> = h.nexus.audit(100).await.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![50, 40, 30]);
}

#[tokio::test(start_paused = true)]
async fn unknown_target_changes_nothing() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::new(vec![decision("NODE-999", -5000)]),
    );
    let before = h.nexus.snapshot().await;
    h.nexus.activate().await;
    assert!(h.nexus.is_active().await);

    // Drive the scheduled first cycle and check the persisted result too.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.provider.calls(), 1);

    let after = h.nexus.snapshot().await;
    assert_eq!(after.workers, before.workers);
    assert!(after.audit.is_empty());
    assert_eq!(after.system.sovereign_points, DEFAULT_SOVEREIGN_SEED);
    assert_eq!(after.system.total_directives, 0);
    assert!(h.nexus.thought().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn rate_limit_suspends_cycles_until_cooldown_elapses() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::new(vec![
            DecisionOutcome::rate_limited(Some(Duration::from_millis(60_000))),
            decision("NODE-001", 700),
        ]),
    );
    activate(&h.nexus).await;
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(
        h.nexus.cooldown_remaining().await,
        Some(Duration::from_secs(60))
    );
    assert_eq!(h.nexus.system_state().await.kernel, KernelPhase::Stable);

    let before = h.nexus.snapshot().await;
    assert_eq!(
        h.nexus.run_cycle().await,
        CycleOutcome::Skipped {
            reason: SkipReason::CoolingDown { remaining_secs: 60 }
        }
    );

    for _ in 0..59 {
        assert!(!h.nexus.tick_second().await);
    }
    assert_eq!(
        h.nexus.cooldown_remaining().await,
        Some(Duration::from_secs(1))
    );
    assert!(matches!(
        h.nexus.run_cycle().await,
        CycleOutcome::Skipped {
            reason: SkipReason::CoolingDown { remaining_secs: 1 }
        }
    ));
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(h.nexus.workers().await, before.workers);
    assert_eq!(h.nexus.audit(10).await.len(), 0);

    assert!(h.nexus.tick_second().await);
    assert_eq!(h.nexus.cooldown_remaining().await, None);

    assert!(matches!(
        h.nexus.run_cycle().await,
        CycleOutcome::Applied { delta: 700, .. }
    ));
    assert_eq!(h.provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_without_wait_uses_default_cooldown() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::new(vec![DecisionOutcome::rate_limited(None)]),
    );
    activate(&h.nexus).await;
    assert_eq!(
        h.nexus.cooldown_remaining().await,
        Some(Duration::from_secs(120))
    );
    let logs = h.nexus.logs().recent(1);
    assert_eq!(logs[0].severity, LogSeverity::Critical);
}

#[tokio::test(start_paused = true)]
async fn provider_failure_and_timeout_leave_state_untouched() {
    let config = GovernanceConfig {
        provider_timeout_secs: 5,
        ..test_config()
    };
    let h = harness(
        config,
        roster(),
        ScriptedProvider::delayed(vec![decision("NODE-001", 900)], Duration::from_secs(10)),
    );
    let before = h.nexus.snapshot().await;

    activate(&h.nexus).await;
    tokio::time::sleep(Duration::from_secs(6)).await;

    let after = h.nexus.snapshot().await;
    assert_eq!(after.workers, before.workers);
    assert!(after.audit.is_empty());
    assert_eq!(after.system.kernel, KernelPhase::Stable);

    let logs = h.nexus.logs().recent(5);
    assert!(logs
        .iter()
        .any(|l| l.severity == LogSeverity::Warning && l.message.contains("DECISION FAILED")));
}

#[tokio::test(start_paused = true)]
async fn deactivation_discards_in_flight_result() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::delayed(vec![decision("NODE-001", 900)], Duration::from_secs(5)),
    );
    activate(&h.nexus).await;
    assert_eq!(h.nexus.system_state().await.kernel, KernelPhase::Thinking);

    assert!(h.nexus.deactivate().await);
    assert!(!h.nexus.deactivate().await);
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(h.nexus.workers().await[0].sovereign_points, 5000);
    assert!(h.nexus.audit(10).await.is_empty());
    assert_eq!(h.nexus.system_state().await.kernel, KernelPhase::Stable);

    // No further provider calls once deactivated.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(
        h.nexus.run_cycle().await,
        CycleOutcome::Skipped {
            reason: SkipReason::Inactive
        }
    );
}

#[tokio::test(start_paused = true)]
async fn display_hold_blocks_cycles_then_returns_to_stable() {
    let config = GovernanceConfig {
        display_hold_ms: 2000,
        ..test_config()
    };
    let h = harness(
        config,
        roster(),
        ScriptedProvider::new(vec![decision("NODE-001", 100), decision("NODE-001", 200)]),
    );
    activate(&h.nexus).await;
    assert_eq!(h.nexus.system_state().await.kernel, KernelPhase::Executing);
    assert_eq!(
        h.nexus.run_cycle().await,
        CycleOutcome::Skipped {
            reason: SkipReason::Busy {
                phase: KernelPhase::Executing
            }
        }
    );

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(h.nexus.system_state().await.kernel, KernelPhase::Stable);
    assert!(h.nexus.run_cycle().await.mutated());
}

#[tokio::test(start_paused = true)]
async fn schedule_repeats_on_cycle_interval() {
    let config = GovernanceConfig {
        cycle_interval_secs: 30,
        ..test_config()
    };
    let h = harness(
        config,
        roster(),
        ScriptedProvider::new(vec![
            decision("NODE-001", 1),
            decision("NODE-001", 2),
            decision("NODE-001", 3),
        ]),
    );
    activate(&h.nexus).await;
    assert_eq!(h.provider.calls(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.provider.calls(), 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.provider.calls(), 3);
    assert_eq!(h.nexus.system_state().await.total_directives, 3);
}

#[tokio::test(start_paused = true)]
async fn empty_roster_is_provisioned_from_proposal() {
    let proposal = RosterProposal {
        workers: (1..=12)
            .map(|n| ProposedWorker {
                id: WorkerId::new(format!("NODE-{:03}", n)),
                name: format!("Worker {}", n),
                activity_points: 0,
                notes: String::new(),
            })
            .collect(),
        monologue: "genesis".to_string(),
        directive: "FLEET_GENESIS".to_string(),
    };
    let h = harness(
        test_config(),
        GovernanceSnapshot::seeded(DEFAULT_SOVEREIGN_SEED),
        ScriptedProvider::new(vec![
            DecisionOutcome::Initialization(proposal.clone()),
            DecisionOutcome::Initialization(proposal),
        ]),
    );
    activate(&h.nexus).await;

    let workers = h.nexus.workers().await;
    assert_eq!(workers.len(), 10);
    assert!(workers.iter().all(|w| w.sovereign_points == 5000));
    assert!(h.nexus.audit(10).await.is_empty());
    assert_eq!(
        h.nexus.system_state().await.sovereign_points,
        DEFAULT_SOVEREIGN_SEED
    );

    assert_eq!(
        h.nexus.run_cycle().await,
        CycleOutcome::InitializationIgnored
    );
    assert_eq!(h.nexus.workers().await.len(), 10);
}

#[tokio::test(start_paused = true)]
async fn manual_audit_floors_and_journals() {
    let h = harness(test_config(), roster(), ScriptedProvider::new(Vec::new()));

    let entry = h
        .nexus
        .report_anomaly(&WorkerId::new("NODE-002"), "Mobile Usage Breach", 1000)
        .await
        .unwrap();
    assert_eq!(entry.kind, AuditKind::Penalty);
    assert_eq!(entry.amount, -1000);
    assert_eq!(entry.reason, "Mobile Usage Breach");

    let workers = h.nexus.workers().await;
    assert_eq!(workers[1].sovereign_points, 0);
    assert_eq!(workers[1].status, WorkerStatus::Warning);
    assert_eq!(
        h.nexus.system_state().await.sovereign_points,
        DEFAULT_SOVEREIGN_SEED - 1000
    );

    let logs = h.nexus.logs().recent(1);
    assert_eq!(logs[0].message, ">>> [AUDIT] MANUAL_INTERVENTION: NODE-002 (-1000 SP)");
    assert_eq!(logs[0].severity, LogSeverity::Critical);

    let persisted = load_snapshot(h.store.as_ref(), DEFAULT_SOVEREIGN_SEED).await;
    assert_eq!(persisted.workers[1].sovereign_points, 0);
    assert_eq!(persisted.audit.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn oversized_manual_penalty_is_clamped_consistently() {
    let h = harness(test_config(), roster(), ScriptedProvider::new(Vec::new()));

    let entry = h
        .nexus
        .report_anomaly(&WorkerId::new("NODE-001"), "Sabotage", u64::MAX)
        .await
        .unwrap();
    assert_eq!(entry.amount, -i64::MAX);
    assert_eq!(
        h.nexus.system_state().await.sovereign_points,
        DEFAULT_SOVEREIGN_SEED - i64::MAX
    );
    assert_eq!(h.nexus.workers().await[0].sovereign_points, 0);

    let logs = h.nexus.logs().recent(1);
    assert_eq!(
        logs[0].message,
        format!(">>> [AUDIT] MANUAL_INTERVENTION: NODE-001 (-{} SP)", MAX_PENALTY)
    );
}

#[tokio::test(start_paused = true)]
async fn manual_audit_works_during_cooldown_and_rejects_unknown_workers() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::new(vec![DecisionOutcome::rate_limited(None)]),
    );
    activate(&h.nexus).await;
    assert!(h.nexus.cooldown_remaining().await.is_some());

    h.nexus
        .report_anomaly(&WorkerId::new("NODE-001"), "Late Arrival", 250)
        .await
        .unwrap();
    assert_eq!(h.nexus.workers().await[0].sovereign_points, 4750);
    assert_eq!(
        h.nexus.cooldown_remaining().await,
        Some(Duration::from_secs(120))
    );

    let err = h
        .nexus
        .report_anomaly(&WorkerId::new("NODE-404"), "Ghost", 250)
        .await
        .unwrap_err();
    assert!(matches!(err, GovernanceError::UnknownWorker(_)));
    assert_eq!(h.nexus.audit(10).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn every_mutation_is_persisted() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::new(vec![decision("NODE-003", -1200)]),
    );
    activate(&h.nexus).await;
    h.nexus.tick_second().await;
    h.nexus.tick_second().await;

    let persisted = load_snapshot(h.store.as_ref(), 0).await;
    let live = h.nexus.snapshot().await;
    assert_eq!(persisted.workers, live.workers);
    assert_eq!(persisted.audit, live.audit);
    assert_eq!(persisted.system.uptime_secs, 2);
    assert_eq!(
        persisted.system.sovereign_points,
        DEFAULT_SOVEREIGN_SEED - 1200
    );
    // Rehydration never resumes mid-cycle.
    assert_eq!(persisted.system.kernel, KernelPhase::Initializing);
}

#[tokio::test(start_paused = true)]
async fn restore_rehydrates_from_store() {
    let store = Arc::new(InMemoryKeyValueStore::new());
    {
        let nexus = GovernanceLoop::new(
            test_config(),
            ScriptedProvider::new(Vec::new()),
            store.clone(),
            roster(),
        );
        nexus
            .report_anomaly(&WorkerId::new("NODE-003"), "Route Deviation", 400)
            .await
            .unwrap();
    }

    let restored = GovernanceLoop::restore(
        test_config(),
        ScriptedProvider::new(Vec::new()),
        store.clone() as Arc<dyn KeyValueStore>,
    )
    .await
    .unwrap();

    let workers = restored.workers().await;
    assert_eq!(workers.len(), 3);
    assert_eq!(workers[2].sovereign_points, 3600);
    assert_eq!(restored.audit(10).await[0].reason, "Route Deviation");
    assert_eq!(
        restored.system_state().await.kernel,
        KernelPhase::Initializing
    );
    assert!(!restored.is_active().await);
}

#[tokio::test(start_paused = true)]
async fn start_runs_clock_and_auto_activates() {
    let config = GovernanceConfig {
        auto_activate: true,
        ..test_config()
    };
    let h = harness(
        config,
        roster(),
        ScriptedProvider::new(vec![decision("NODE-001", 10)]),
    );
    h.nexus.start().await;
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let status = h.nexus.status().await;
    assert!(status.active);
    assert_eq!(status.system.uptime_secs, 3);
    assert_eq!(status.system.total_directives, 1);
    assert_eq!(status.provider, "scripted");

    let first = h.nexus.ticker().unwrap();
    assert_eq!(first.index, 3);

    h.nexus.shutdown().await;
    assert!(!h.nexus.is_active().await);
    let uptime = h.nexus.system_state().await.uptime_secs;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.nexus.system_state().await.uptime_secs, uptime);
}

#[tokio::test(start_paused = true)]
async fn cooldown_and_uptime_follow_wall_time_with_a_fast_clock() {
    let config = GovernanceConfig {
        auto_activate: true,
        clock_interval_ms: 500,
        ..test_config()
    };
    let h = harness(
        config,
        roster(),
        ScriptedProvider::new(vec![DecisionOutcome::rate_limited(Some(
            Duration::from_secs(60),
        ))]),
    );
    h.nexus.start().await;
    tokio::time::sleep(Duration::from_millis(30_100)).await;

    assert_eq!(h.provider.calls(), 1);
    assert_eq!(
        h.nexus.cooldown_remaining().await,
        Some(Duration::from_secs(30))
    );
    assert_eq!(h.nexus.system_state().await.uptime_secs, 30);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.nexus.cooldown_remaining().await, None);
    assert_eq!(h.nexus.system_state().await.uptime_secs, 60);

    h.nexus.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_clock_still_counts_every_second() {
    let config = GovernanceConfig {
        clock_interval_ms: 2500,
        ..test_config()
    };
    let h = harness(config, roster(), ScriptedProvider::new(Vec::new()));
    h.nexus.start().await;

    tokio::time::sleep(Duration::from_millis(10_100)).await;
    assert_eq!(h.nexus.system_state().await.uptime_secs, 10);

    h.nexus.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn log_subscribers_see_cycle_output() {
    let h = harness(
        test_config(),
        roster(),
        ScriptedProvider::new(vec![decision("NODE-001", 10)]),
    );
    let mut rx = h.nexus.subscribe_logs();
    activate(&h.nexus).await;

    let mut messages = Vec::new();
    while let Ok(entry) = rx.try_recv() {
        messages.push(entry.message);
    }
    assert!(messages.iter().any(|m| m.contains("BOOTING")));
    assert!(messages.iter().any(|m| m.contains("[AGENT_DECREE]")));
}

#[tokio::test(start_paused = true)]
async fn local_provider_drives_a_full_session() {
    let store = Arc::new(InMemoryKeyValueStore::new());
    let nexus = GovernanceLoop::new(
        test_config(),
        Arc::new(LocalDecisionProvider::with_seed(Duration::ZERO, 11)),
        store,
        GovernanceSnapshot::seeded(DEFAULT_SOVEREIGN_SEED),
    );
    activate(&nexus).await;
    assert_eq!(nexus.workers().await.len(), 10);

    let mut sum = 0i64;
    for _ in 0..5 {
        match nexus.run_cycle().await {
            CycleOutcome::Applied { delta, .. } => sum += delta,
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    assert_eq!(
        nexus.system_state().await.sovereign_points,
        DEFAULT_SOVEREIGN_SEED + sum
    );
    assert_eq!(nexus.audit(100).await.len(), 5);
}
