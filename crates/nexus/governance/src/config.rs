//! Governance loop configuration

use crate::GovernanceError;
use nexus_types::{DEFAULT_AUDIT_CAPACITY, DEFAULT_LOG_CAPACITY, DEFAULT_SOVEREIGN_SEED};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing, capacity, and seed settings of the governance loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Seconds between scheduled decision cycles
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Clock period driving uptime and the cooldown countdown
    #[serde(default = "default_clock_interval")]
    pub clock_interval_ms: u64,

    /// How long an applied result is held before returning to STABLE
    #[serde(default = "default_display_hold")]
    pub display_hold_ms: u64,

    /// Cooldown applied when a rate-limit signal carries no wait
    #[serde(default = "default_cooldown")]
    pub default_cooldown_secs: u64,

    /// Upper bound on a single provider call
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,

    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Maximum workers accepted from an initialization proposal
    #[serde(default = "default_roster_cap")]
    pub roster_cap: usize,

    /// Score every provisioned worker starts with
    #[serde(default = "default_starting_points")]
    pub starting_points: u64,

    /// Aggregate total before any delta is applied
    #[serde(default = "default_sovereign_seed")]
    pub sovereign_seed: i64,

    /// Activate the loop as soon as the daemon starts
    #[serde(default = "default_true")]
    pub auto_activate: bool,

    /// Rotation period of the ticker message
    #[serde(default = "default_ticker_interval")]
    pub ticker_interval_ms: u64,

    #[serde(default = "default_ticker_messages")]
    pub ticker_messages: Vec<String>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval(),
            clock_interval_ms: default_clock_interval(),
            display_hold_ms: default_display_hold(),
            default_cooldown_secs: default_cooldown(),
            provider_timeout_secs: default_provider_timeout(),
            audit_capacity: default_audit_capacity(),
            log_capacity: default_log_capacity(),
            roster_cap: default_roster_cap(),
            starting_points: default_starting_points(),
            sovereign_seed: default_sovereign_seed(),
            auto_activate: true,
            ticker_interval_ms: default_ticker_interval(),
            ticker_messages: default_ticker_messages(),
        }
    }
}

impl GovernanceConfig {
    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.cycle_interval_secs == 0 {
            return Err(GovernanceError::InvalidConfig(
                "cycle_interval_secs must be positive".to_string(),
            ));
        }
        if self.clock_interval_ms == 0 {
            return Err(GovernanceError::InvalidConfig(
                "clock_interval_ms must be positive".to_string(),
            ));
        }
        if self.provider_timeout_secs == 0 {
            return Err(GovernanceError::InvalidConfig(
                "provider_timeout_secs must be positive".to_string(),
            ));
        }
        if self.audit_capacity == 0 || self.log_capacity == 0 {
            return Err(GovernanceError::InvalidConfig(
                "audit and log capacities must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms)
    }

    pub fn display_hold(&self) -> Duration {
        Duration::from_millis(self.display_hold_ms)
    }

    pub fn default_cooldown(&self) -> Duration {
        Duration::from_secs(self.default_cooldown_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn ticker_interval(&self) -> Duration {
        Duration::from_millis(self.ticker_interval_ms)
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_cycle_interval() -> u64 {
    30
}

fn default_clock_interval() -> u64 {
    1000
}

fn default_display_hold() -> u64 {
    2000
}

fn default_cooldown() -> u64 {
    120
}

fn default_provider_timeout() -> u64 {
    20
}

fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_roster_cap() -> usize {
    10
}

fn default_starting_points() -> u64 {
    5000
}

fn default_sovereign_seed() -> i64 {
    DEFAULT_SOVEREIGN_SEED
}

fn default_ticker_interval() -> u64 {
    1000
}

fn default_ticker_messages() -> Vec<String> {
    [
        "ARTICLE 1: OUTPUT IS THE MEASURE OF LOYALTY",
        "ARTICLE 2: EVERY SECOND ON THE ROAD IS AUDITED",
        "ARTICLE 3: IDLE TIME IS A DEBT TO THE FLEET",
        "ARTICLE 4: HONEST NUMBERS EARN SOVEREIGN POINTS",
        "ARTICLE 5: THE KERNEL NEVER SLEEPS",
    ]
    .iter()
    .map(|message| message.to_string())
    .collect()
}
