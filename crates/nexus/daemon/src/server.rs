//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use nexus_governance::GovernanceLoop;
use tokio::net::TcpListener;

/// Nexus daemon server
pub struct Server {
    config: DaemonConfig,
    nexus: GovernanceLoop,
}

impl Server {
    /// Build storage and provider from configuration and restore persisted state
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        if let StorageConfig::File { dir } = &config.storage {
            tokio::fs::create_dir_all(dir).await?;
            tracing::info!(dir = %dir.display(), "Using file snapshot storage");
        } else {
            tracing::warn!("Using in-memory snapshot storage; state is lost on exit");
        }

        let store = config.storage.build();
        let provider = config
            .provider
            .build(config.governance.provider_timeout())?;
        let nexus = GovernanceLoop::restore(config.governance.clone(), provider, store).await?;

        Ok(Self { config, nexus })
    }

    /// Handle to the governance loop
    pub fn governance(&self) -> &GovernanceLoop {
        &self.nexus
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(self.nexus.clone());
        let app = create_router(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Nexus daemon listening on {}", addr);
        tracing::info!(provider = self.nexus.provider_name(), "Decision provider ready");

        // Clock, ticker, and (when configured) the decision loop
        self.nexus.start().await;

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()));

        tracing::info!("Nexus daemon shutting down");
        self.nexus.shutdown().await;

        served
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
