//! Aggregate system state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seed value of the aggregate sovereign-point total
pub const DEFAULT_SOVEREIGN_SEED: i64 = 2_450_000;

/// Phase of the governance kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KernelPhase {
    /// Not yet activated since process start.
    #[default]
    Initializing,
    /// A provider request is in flight.
    Thinking,
    /// A result was applied and is held for display.
    Executing,
    /// Idle, accepting the next scheduled trigger.
    Stable,
}

impl fmt::Display for KernelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelPhase::Initializing => write!(f, "INITIALIZING"),
            KernelPhase::Thinking => write!(f, "THINKING"),
            KernelPhase::Executing => write!(f, "EXECUTING"),
            KernelPhase::Stable => write!(f, "STABLE"),
        }
    }
}

/// Scalar aggregate of the governance loop.
///
/// `sovereign_points` always equals the seed plus every applied delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    pub kernel: KernelPhase,
    pub uptime_secs: u64,
    pub total_directives: u64,
    pub sovereign_points: i64,
}

impl Default for SystemState {
    fn default() -> Self {
        Self::seeded(DEFAULT_SOVEREIGN_SEED)
    }
}

impl SystemState {
    pub fn seeded(sovereign_points: i64) -> Self {
        Self {
            kernel: KernelPhase::Initializing,
            uptime_secs: 0,
            total_directives: 0,
            sovereign_points,
        }
    }

    /// Fold an applied delta into the aggregate total.
    pub fn record_delta(&mut self, delta: i64) {
        self.sovereign_points = self.sovereign_points.saturating_add(delta);
    }

    /// Count a provider directive and fold its delta in.
    pub fn record_directive(&mut self, delta: i64) {
        self.total_directives += 1;
        self.record_delta(delta);
    }

    pub fn advance_uptime(&mut self, secs: u64) {
        self.uptime_secs = self.uptime_secs.saturating_add(secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_seeded_and_initializing() {
        let state = SystemState::default();
        assert_eq!(state.kernel, KernelPhase::Initializing);
        assert_eq!(state.sovereign_points, DEFAULT_SOVEREIGN_SEED);
        assert_eq!(state.total_directives, 0);
    }

    #[test]
    fn directives_accumulate() {
        let mut state = SystemState::seeded(1000);
        state.record_directive(-1200);
        state.record_directive(500);
        state.record_delta(-100);
        assert_eq!(state.total_directives, 2);
        assert_eq!(state.sovereign_points, 200);
    }

    #[test]
    fn phase_serializes_in_upper_case() {
        assert_eq!(
            serde_json::to_string(&KernelPhase::Thinking).unwrap(),
            "\"THINKING\""
        );
    }
}
