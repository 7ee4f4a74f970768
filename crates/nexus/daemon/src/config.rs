//! Configuration for nexus-daemon

use nexus_governance::GovernanceConfig;
use nexus_provider::{
    DecisionProvider, HttpDecisionProvider, HttpProviderConfig, LocalDecisionProvider,
    ProviderError,
};
use nexus_storage::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Snapshot storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Decision provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Governance loop configuration
    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage; state is lost on exit
    #[default]
    Memory,

    /// One JSON file per snapshot key
    File {
        /// Directory holding the snapshot files
        #[serde(default = "default_data_dir")]
        dir: PathBuf,
    },
}

impl StorageConfig {
    pub fn build(&self) -> Arc<dyn KeyValueStore> {
        match self {
            StorageConfig::Memory => Arc::new(InMemoryKeyValueStore::new()),
            StorageConfig::File { dir } => Arc::new(FileKeyValueStore::new(dir.clone())),
        }
    }
}

/// Decision provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Local random-template provider
    Local {
        /// Simulated thinking time in milliseconds
        #[serde(default = "default_think_delay")]
        think_delay_ms: u64,
    },

    /// Remote reasoning endpoint
    Http {
        /// URL the decision request is POSTed to
        endpoint: String,

        /// Environment variable holding the bearer API key
        #[serde(default)]
        api_key_env: Option<String>,

        /// Request timeout in seconds.
        ///
        /// Must stay below the loop's `provider_timeout_secs`; when unset or
        /// too large it is derived from that budget.
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Local {
            think_delay_ms: default_think_delay(),
        }
    }
}

impl ProviderConfig {
    /// Build the provider. `call_budget` is the loop's outer timeout for one
    /// decision call.
    pub fn build(&self, call_budget: Duration) -> Result<Arc<dyn DecisionProvider>, ProviderError> {
        match self {
            ProviderConfig::Local { think_delay_ms } => Ok(Arc::new(LocalDecisionProvider::new(
                Duration::from_millis(*think_delay_ms),
            ))),
            ProviderConfig::Http {
                endpoint,
                api_key_env,
                timeout_secs,
            } => {
                let mut config = HttpProviderConfig::new(endpoint.clone())
                    .with_timeout(http_timeout(*timeout_secs, call_budget));

                if let Some(var) = api_key_env {
                    match std::env::var(var) {
                        Ok(key) if !key.trim().is_empty() => config = config.with_api_key(key),
                        _ => tracing::warn!(env = %var, "API key variable is unset, calling without auth"),
                    }
                }

                Ok(Arc::new(HttpDecisionProvider::new(config)?))
            }
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("nexus-data")
}

fn default_think_delay() -> u64 {
    1500
}

/// Request timeout for the HTTP provider.
///
/// Kept inside `call_budget` so the client reports its own timeout
/// before the loop abandons the call.
fn http_timeout(configured: Option<u64>, call_budget: Duration) -> Duration {
    let derived = (call_budget * 3 / 4).max(Duration::from_secs(1));
    match configured.map(Duration::from_secs) {
        Some(timeout) if !timeout.is_zero() && timeout < call_budget => timeout,
        Some(timeout) => {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                budget_secs = call_budget.as_secs(),
                derived_ms = derived.as_millis() as u64,
                "HTTP provider timeout does not fit the decision call budget"
            );
            derived
        }
        None => derived,
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then `NEXUS_` variables.
    ///
    /// Nested keys use a double underscore, e.g. `NEXUS_GOVERNANCE__CYCLE_INTERVAL_SECS`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with NEXUS_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("NEXUS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.storage, StorageConfig::Memory);
        assert!(matches!(
            config.provider,
            ProviderConfig::Local {
                think_delay_ms: 1500
            }
        ));
        assert_eq!(config.governance.cycle_interval_secs, 30);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
listen_addr = "0.0.0.0:9090"

[storage]
type = "file"
dir = "/var/lib/nexus"

[provider]
type = "http"
endpoint = "http://localhost:7000/decide"

[governance]
cycle_interval_secs = 10
auto_activate = false
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = DaemonConfig::load(Some(&path)).unwrap();

        assert_eq!(config.server.listen_addr.port(), 9090);
        assert_eq!(
            config.storage,
            StorageConfig::File {
                dir: PathBuf::from("/var/lib/nexus")
            }
        );
        assert!(matches!(
            config.provider,
            ProviderConfig::Http {
                timeout_secs: None,
                ..
            }
        ));
        assert_eq!(config.governance.cycle_interval_secs, 10);
        assert!(!config.governance.auto_activate);
        assert_eq!(config.governance.display_hold_ms, 2000);
    }

    #[test]
    fn test_provider_build() {
        let budget = GovernanceConfig::default().provider_timeout();
        let local = ProviderConfig::default().build(budget).unwrap();
        assert_eq!(local.name(), "local");

        let missing_endpoint = ProviderConfig::Http {
            endpoint: String::new(),
            api_key_env: None,
            timeout_secs: Some(5),
        };
        assert!(missing_endpoint.build(budget).is_err());
    }

    #[test]
    fn test_http_timeout_stays_inside_call_budget() {
        let budget = GovernanceConfig::default().provider_timeout();
        assert_eq!(budget, Duration::from_secs(20));

        assert_eq!(http_timeout(None, budget), Duration::from_secs(15));
        assert_eq!(http_timeout(Some(5), budget), Duration::from_secs(5));
        assert_eq!(http_timeout(Some(20), budget), Duration::from_secs(15));
        assert_eq!(http_timeout(Some(30), budget), Duration::from_secs(15));
        assert_eq!(http_timeout(Some(0), budget), Duration::from_secs(15));
        assert_eq!(
            http_timeout(None, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
    }
}
