//! The governance loop: scheduling, the decision cycle, and manual audits

use crate::config::GovernanceConfig;
use crate::context::GovernanceContext;
use crate::log_sink::LogSink;
use crate::task::{RepeatingTask, TaskHandle};
use crate::penalty::MAX_PENALTY;
use crate::GovernanceError;
use nexus_provider::{DecisionOutcome, DecisionProvider, ProviderError};
use nexus_storage::{load_snapshot, save_snapshot, GovernanceSnapshot, KeyValueStore};
use nexus_types::{
    AuditEntry, KernelPhase, LogEntry, LogSeverity, SystemState, Thought, Worker, WorkerId,
};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::Instant;

/// Why a cycle did not call the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Inactive,
    CoolingDown { remaining_secs: u64 },
    Busy { phase: KernelPhase },
}

/// What one call to [`GovernanceLoop::run_cycle`] did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    Skipped {
        reason: SkipReason,
    },
    /// The loop was deactivated while the provider call was in flight.
    Discarded,
    RateLimited {
        cooldown_secs: u64,
    },
    Initialized {
        workers: usize,
    },
    /// A roster proposal arrived while a roster already exists.
    InitializationIgnored,
    Applied {
        worker_id: WorkerId,
        delta: i64,
        new_points: u64,
        entry: AuditEntry,
    },
    UnknownTarget,
    Failed {
        error: String,
    },
}

impl CycleOutcome {
    /// Whether the cycle changed workers, audit log, or totals.
    pub fn mutated(&self) -> bool {
        matches!(
            self,
            CycleOutcome::Initialized { .. } | CycleOutcome::Applied { .. }
        )
    }
}

/// Point-in-time view of the loop for status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct LoopStatus {
    pub active: bool,
    pub provider: String,
    pub system: SystemState,
    pub cooldown_remaining_secs: Option<u64>,
    pub worker_count: usize,
    pub audit_count: usize,
    pub thought: Option<Thought>,
}

/// Current rotating ticker message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerMessage {
    pub index: usize,
    pub message: String,
}

struct Inner {
    config: GovernanceConfig,
    provider: Arc<dyn DecisionProvider>,
    store: Arc<dyn KeyValueStore>,
    context: Mutex<GovernanceContext>,
    logs: LogSink,
    ticker_index: AtomicUsize,
    cycle_task: Mutex<Option<TaskHandle>>,
    background: Mutex<Vec<TaskHandle>>,
}

/// Cloneable handle to one governance loop
#[derive(Clone)]
pub struct GovernanceLoop {
    inner: Arc<Inner>,
}

impl GovernanceLoop {
    /// Build a loop around an already loaded snapshot.
    pub fn new(
        config: GovernanceConfig,
        provider: Arc<dyn DecisionProvider>,
        store: Arc<dyn KeyValueStore>,
        snapshot: GovernanceSnapshot,
    ) -> Self {
        let context = GovernanceContext::new(snapshot, config.audit_capacity);
        let logs = LogSink::new(config.log_capacity);

        Self {
            inner: Arc::new(Inner {
                config,
                provider,
                store,
                context: Mutex::new(context),
                logs,
                ticker_index: AtomicUsize::new(0),
                cycle_task: Mutex::new(None),
                background: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Validate the configuration and rehydrate state from `store`.
    pub async fn restore(
        config: GovernanceConfig,
        provider: Arc<dyn DecisionProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, GovernanceError> {
        config.validate()?;
        let snapshot = load_snapshot(store.as_ref(), config.sovereign_seed).await;

        tracing::info!(
            workers = snapshot.workers.len(),
            audit_entries = snapshot.audit.len(),
            sovereign_points = snapshot.system.sovereign_points,
            uptime_secs = snapshot.system.uptime_secs,
            provider = provider.name(),
            "Governance state restored"
        );

        Ok(Self::new(config, provider, store, snapshot))
    }

    fn from_weak(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.inner.config
    }

    pub fn provider_name(&self) -> &str {
        self.inner.provider.name()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Spawn the clock and the message ticker, then activate when configured.
    ///
    /// Calling `start` twice is a no-op.
    pub async fn start(&self) {
        {
            let mut background = self.inner.background.lock().await;
            if !background.is_empty() {
                return;
            }

            let weak = Arc::downgrade(&self.inner);
            let mut last_tick = Instant::now();
            background.push(RepeatingTask::spawn(
                "governance-clock",
                self.inner.config.clock_interval(),
                false,
                move || {
                    let weak = weak.clone();
                    let now = Instant::now();
                    let elapsed = now.saturating_duration_since(last_tick);
                    last_tick = now;
                    async move {
                        if let Some(nexus) = GovernanceLoop::from_weak(&weak) {
                            nexus.advance_clock(elapsed).await;
                        }
                    }
                },
            ));

            if !self.inner.config.ticker_messages.is_empty() {
                let weak = Arc::downgrade(&self.inner);
                background.push(RepeatingTask::spawn(
                    "governance-ticker",
                    self.inner.config.ticker_interval(),
                    false,
                    move || {
                        let weak = weak.clone();
                        async move {
                            if let Some(nexus) = GovernanceLoop::from_weak(&weak) {
                                nexus.advance_ticker();
                            }
                        }
                    },
                ));
            }
        }

        tracing::info!(
            cycle_interval_secs = self.inner.config.cycle_interval_secs,
            auto_activate = self.inner.config.auto_activate,
            "Governance loop started"
        );

        if self.inner.config.auto_activate {
            self.activate().await;
        }
    }

    /// Deactivate, stop every background task, and write a final snapshot.
    pub async fn shutdown(&self) {
        self.deactivate().await;

        let handles: Vec<TaskHandle> = self.inner.background.lock().await.drain(..).collect();
        for handle in handles {
            handle.stop().await;
        }

        if let Err(err) = self.flush().await {
            tracing::warn!(error = %err, "Final snapshot write failed");
        }
        tracing::info!("Governance loop stopped");
    }

    /// Turn the decision loop on.
    ///
    /// Schedules a cycle immediately and then every cycle interval. Returns
    /// `false` when the loop was already active.
    pub async fn activate(&self) -> bool {
        let mut slot = self.inner.cycle_task.lock().await;

        let first_boot = {
            let mut ctx = self.inner.context.lock().await;
            if ctx.active {
                return false;
            }
            ctx.active = true;
            ctx.epoch += 1;
            ctx.set_phase(KernelPhase::Stable);
            let first_boot = !ctx.booted;
            ctx.booted = true;
            self.persist(&ctx).await;
            first_boot
        };

        if first_boot {
            self.add_log(">>> [SYS] GOVERNANCE KERNEL BOOTING...", LogSeverity::Warning);
        }
        self.add_log(
            format!(
                ">>> [AUTH] AGENT ACCESS GRANTED. {} INTELLIGENCE ONLINE.",
                self.provider_name().to_uppercase()
            ),
            LogSeverity::Info,
        );

        let weak = Arc::downgrade(&self.inner);
        *slot = Some(RepeatingTask::spawn(
            "governance-cycle",
            self.inner.config.cycle_interval(),
            true,
            move || {
                let weak = weak.clone();
                async move {
                    if let Some(nexus) = GovernanceLoop::from_weak(&weak) {
                        let outcome = nexus.run_cycle().await;
                        tracing::debug!(outcome = ?outcome, "Scheduled cycle finished");
                    }
                }
            },
        ));

        true
    }

    /// Turn the decision loop off.
    ///
    /// No further provider calls are issued and any call still in flight is
    /// discarded when it returns. Returns `false` when already inactive.
    pub async fn deactivate(&self) -> bool {
        let mut slot = self.inner.cycle_task.lock().await;

        {
            let mut ctx = self.inner.context.lock().await;
            if !ctx.active {
                return false;
            }
            ctx.active = false;
            ctx.epoch += 1;
            if ctx.snapshot.system.kernel != KernelPhase::Initializing {
                ctx.set_phase(KernelPhase::Stable);
            }
            self.persist(&ctx).await;
        }

        if let Some(handle) = slot.take() {
            handle.cancel();
        }

        self.add_log(">>> [SYS] GOVERNANCE LOOP SUSPENDED", LogSeverity::Warning);
        true
    }

    // ---------------------------------------------------------------------
    // Decision cycle
    // ---------------------------------------------------------------------

    /// Run one decision cycle.
    ///
    /// Skipped unless the loop is active, no cooldown is running, and the
    /// kernel is `STABLE`. Never panics and never returns an error: every
    /// provider problem degrades to "no change this cycle".
    pub async fn run_cycle(&self) -> CycleOutcome {
        let (epoch, seq, request) = {
            let mut ctx = self.inner.context.lock().await;
            if !ctx.active {
                return CycleOutcome::Skipped {
                    reason: SkipReason::Inactive,
                };
            }
            if ctx.cooldown_secs > 0 {
                return CycleOutcome::Skipped {
                    reason: SkipReason::CoolingDown {
                        remaining_secs: ctx.cooldown_secs,
                    },
                };
            }
            let phase = ctx.snapshot.system.kernel;
            if phase != KernelPhase::Stable {
                return CycleOutcome::Skipped {
                    reason: SkipReason::Busy { phase },
                };
            }

            ctx.set_phase(KernelPhase::Thinking);
            ctx.cycle_seq += 1;
            self.persist(&ctx).await;
            (ctx.epoch, ctx.cycle_seq, ctx.build_request())
        };

        self.add_log(
            format!(
                ">>> [KERNEL] THINKING: {} workers under review",
                request.workers.len()
            ),
            LogSeverity::Info,
        );

        let timeout = self.inner.config.provider_timeout();
        let outcome =
            match tokio::time::timeout(timeout, self.inner.provider.request_decision(&request))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => DecisionOutcome::Failure(ProviderError::Timeout(timeout)),
            };

        let mut ctx = self.inner.context.lock().await;
        if !ctx.active || ctx.epoch != epoch {
            tracing::debug!(outcome = outcome.label(), "Discarding stale provider result");
            return CycleOutcome::Discarded;
        }

        let result = match outcome {
            DecisionOutcome::RateLimited { retry_after } => {
                let secs = ctx.enter_cooldown(retry_after, self.inner.config.default_cooldown());
                ctx.set_phase(KernelPhase::Stable);
                self.persist(&ctx).await;
                drop(ctx);

                self.add_log(
                    format!(
                        ">>> [KERNEL] RATE_LIMITED: decision quota exhausted, cooling down for {}s",
                        secs
                    ),
                    LogSeverity::Critical,
                );
                return CycleOutcome::RateLimited {
                    cooldown_secs: secs,
                };
            }
            DecisionOutcome::Initialization(proposal) => {
                let directive = proposal.directive.clone();
                match ctx.provision_roster(
                    proposal,
                    self.inner.config.roster_cap,
                    self.inner.config.starting_points,
                ) {
                    Some(count) => {
                        ctx.set_phase(KernelPhase::Executing);
                        self.add_log(
                            format!(
                                ">>> [GENESIS] {} ROSTER PROVISIONED: {} WORKERS @ {} SP",
                                directive, count, self.inner.config.starting_points
                            ),
                            LogSeverity::Info,
                        );
                        CycleOutcome::Initialized { workers: count }
                    }
                    None => {
                        self.add_log(
                            ">>> [KERNEL] Roster proposal ignored: roster already provisioned",
                            LogSeverity::Warning,
                        );
                        CycleOutcome::InitializationIgnored
                    }
                }
            }
            DecisionOutcome::Decision(decision) => match ctx.apply_decision(&decision) {
                Some(applied) => {
                    ctx.set_phase(KernelPhase::Executing);
                    let severity = if applied.delta < 0 {
                        LogSeverity::Critical
                    } else {
                        LogSeverity::Info
                    };
                    self.add_log(
                        format!(
                            ">>> [AGENT_DECREE] {} ON {}: {} SP",
                            applied.action, applied.worker_id, applied.delta
                        ),
                        severity,
                    );
                    CycleOutcome::Applied {
                        worker_id: applied.worker_id,
                        delta: applied.delta,
                        new_points: applied.new_points,
                        entry: applied.entry,
                    }
                }
                None => {
                    tracing::debug!(
                        target_worker = ?decision.target_worker_id,
                        "Decision names no worker on the roster"
                    );
                    CycleOutcome::UnknownTarget
                }
            },
            DecisionOutcome::Failure(err) => {
                tracing::warn!(error = %err, provider = self.provider_name(), "Decision cycle failed");
                self.add_log(
                    format!(">>> [KERNEL] DECISION FAILED: {}", err),
                    LogSeverity::Warning,
                );
                CycleOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        let hold = self.inner.config.display_hold();
        if hold.is_zero() {
            ctx.set_phase(KernelPhase::Stable);
        }
        self.persist(&ctx).await;
        drop(ctx);

        if !hold.is_zero() {
            self.schedule_hold_revert(hold, epoch, seq);
        }
        result
    }

    fn schedule_hold_revert(&self, hold: Duration, epoch: u64, seq: u64) {
        let nexus = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;

            let mut ctx = nexus.inner.context.lock().await;
            if ctx.epoch != epoch || ctx.cycle_seq != seq {
                return;
            }
            if matches!(
                ctx.snapshot.system.kernel,
                KernelPhase::Thinking | KernelPhase::Executing
            ) {
                ctx.set_phase(KernelPhase::Stable);
                nexus.persist(&ctx).await;
            }
        });
    }

    // ---------------------------------------------------------------------
    // Clock and ticker
    // ---------------------------------------------------------------------

    /// Advance uptime and the cooldown by exactly one second.
    ///
    /// Returns `true` when this tick ended the cooldown.
    pub async fn tick_second(&self) -> bool {
        self.advance_clock(Duration::from_secs(1)).await
    }

    /// Feed `elapsed` wall time into the clock.
    ///
    /// Uptime and the cooldown move in whole seconds whatever the clock
    /// period; sub-second remainders carry over. Returns `true` when this
    /// advance ended the cooldown.
    pub async fn advance_clock(&self, elapsed: Duration) -> bool {
        let step = {
            let mut ctx = self.inner.context.lock().await;
            let step = ctx.advance_clock(elapsed);
            if step.seconds > 0 {
                self.persist(&ctx).await;
            }
            step
        };

        let cleared = step.cooldown_cleared;
        if cleared {
            self.add_log(
                ">>> [KERNEL] COOLDOWN ELAPSED. DECISION CYCLES RESUME",
                LogSeverity::Info,
            );
        }
        cleared
    }

    pub fn ticker(&self) -> Option<TickerMessage> {
        let messages = &self.inner.config.ticker_messages;
        if messages.is_empty() {
            return None;
        }
        let index = self.inner.ticker_index.load(Ordering::Relaxed) % messages.len();
        Some(TickerMessage {
            index,
            message: messages[index].clone(),
        })
    }

    pub fn advance_ticker(&self) -> Option<TickerMessage> {
        let len = self.inner.config.ticker_messages.len();
        if len == 0 {
            return None;
        }
        let _ = self
            .inner
            .ticker_index
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |index| {
                Some((index + 1) % len)
            });
        self.ticker()
    }

    // ---------------------------------------------------------------------
    // Manual audit and log feed
    // ---------------------------------------------------------------------

    /// Deduct `penalty` from a worker on behalf of an operator.
    ///
    /// Independent of the decision cycle and of any cooldown. Penalties
    /// above [`MAX_PENALTY`] are clamped before they are journaled.
    pub async fn report_anomaly(
        &self,
        worker_id: &WorkerId,
        violation: &str,
        penalty: u64,
    ) -> Result<AuditEntry, GovernanceError> {
        let penalty = penalty.min(MAX_PENALTY);
        let entry = {
            let mut ctx = self.inner.context.lock().await;
            let entry = ctx.apply_penalty(worker_id, violation, penalty)?;
            self.persist(&ctx).await;
            entry
        };

        self.add_log(
            format!(
                ">>> [AUDIT] MANUAL_INTERVENTION: {} (-{} SP)",
                worker_id, penalty
            ),
            LogSeverity::Critical,
        );
        Ok(entry)
    }

    pub fn add_log(&self, message: impl Into<String>, severity: LogSeverity) -> LogEntry {
        self.inner.logs.add_log(message, severity)
    }

    pub fn logs(&self) -> &LogSink {
        &self.inner.logs
    }

    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.logs.subscribe()
    }

    // ---------------------------------------------------------------------
    // Read access
    // ---------------------------------------------------------------------

    pub async fn status(&self) -> LoopStatus {
        let ctx = self.inner.context.lock().await;
        LoopStatus {
            active: ctx.is_active(),
            provider: self.provider_name().to_string(),
            system: ctx.system().clone(),
            cooldown_remaining_secs: ctx.cooldown_remaining().map(|d| d.as_secs()),
            worker_count: ctx.workers().len(),
            audit_count: ctx.snapshot().audit.len(),
            thought: ctx.thought().cloned(),
        }
    }

    pub async fn system_state(&self) -> SystemState {
        self.inner.context.lock().await.system().clone()
    }

    pub async fn workers(&self) -> Vec<Worker> {
        self.inner.context.lock().await.workers().to_vec()
    }

    pub async fn audit(&self, limit: usize) -> Vec<AuditEntry> {
        self.inner.context.lock().await.snapshot().audit.recent(limit)
    }

    pub async fn thought(&self) -> Option<Thought> {
        self.inner.context.lock().await.thought().cloned()
    }

    pub async fn is_active(&self) -> bool {
        self.inner.context.lock().await.is_active()
    }

    pub async fn cooldown_remaining(&self) -> Option<Duration> {
        self.inner.context.lock().await.cooldown_remaining()
    }

    pub async fn snapshot(&self) -> GovernanceSnapshot {
        self.inner.context.lock().await.snapshot().clone()
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Write the current snapshot, reporting failures to the caller.
    pub async fn flush(&self) -> Result<(), GovernanceError> {
        let ctx = self.inner.context.lock().await;
        save_snapshot(self.inner.store.as_ref(), ctx.snapshot()).await?;
        Ok(())
    }

    async fn persist(&self, ctx: &GovernanceContext) {
        if let Err(err) = save_snapshot(self.inner.store.as_ref(), ctx.snapshot()).await {
            tracing::warn!(error = %err, "Failed to persist governance snapshot");
        }
    }
}
