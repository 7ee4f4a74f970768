//! Repeating background work with explicit cancellation

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Handle to a running [`RepeatingTask`].
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    cancel_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ask the task to stop after its current run, if any.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the task to exit.
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                tracing::warn!(task = self.name, error = %err, "Repeating task ended abnormally");
            }
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runs a job on a fixed period until cancelled.
///
/// Runs never overlap: a slow run delays the next tick instead of
/// stacking up missed ones.
pub struct RepeatingTask;

impl RepeatingTask {
    pub fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        fire_immediately: bool,
        mut job: F,
    ) -> TaskHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let start = if fire_immediately {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(task = name, period_ms = period.as_millis() as u64, "Repeating task started");

            loop {
                tokio::select! {
                    biased;
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        job().await;
                    }
                }
            }

            tracing::debug!(task = name, "Repeating task stopped");
        });

        TaskHandle {
            name,
            cancel_tx,
            join: Some(join),
        }
    }
}
