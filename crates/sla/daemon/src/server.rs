//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, MailConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::mail::{LogMailTransport, WebhookMailTransport};
use crate::scheduler::Scheduler;
use crate::storage::{connect_pool, PostgresHelpdesk, PostgresTrackingStore};
use chrono::Utc;
use sla_engine::memory::{InMemoryDirectory, InMemoryTicketStore, InMemoryTrackingStore};
use sla_engine::{CycleReport, MailTransport, SlaOrchestrator};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// SLA Daemon Server
pub struct Server {
    config: DaemonConfig,
    engine: Arc<SlaOrchestrator>,
    scheduler: Arc<Scheduler>,
    trigger_rx: mpsc::Receiver<()>,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config
            .validate()
            .map_err(|e| DaemonError::Config(e.to_string()))?;

        let engine = Arc::new(build_engine(&config).await?);
        let (scheduler, trigger_rx) = Scheduler::new(config.scheduler.clone(), engine.clone());

        Ok(Self {
            config,
            engine,
            scheduler,
            trigger_rx,
        })
    }

    /// Shared state for the REST API
    pub fn state(&self) -> AppState {
        AppState::new(self.engine.clone(), self.scheduler.clone())
    }

    /// Run exactly one cycle and return its report
    pub async fn run_once(&self) -> CycleReport {
        self.engine.run_cycle(Utc::now()).await
    }

    /// Run the scheduler, and the REST API if enabled, until a shutdown
    /// signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let state = self.state();
        let Server {
            config,
            scheduler,
            trigger_rx,
            ..
        } = self;

        // Start scheduler in background
        let scheduler_handle = tokio::spawn(scheduler.clone().start(trigger_rx));

        if config.server.enabled {
            let addr = config.server.listen_addr;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!("SLA daemon listening on {}", addr);

            axum::serve(listener, create_router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(|e| DaemonError::Server(e.to_string()))?;
        } else {
            tracing::info!("REST API disabled");
            shutdown_signal().await;
        }

        tracing::info!("SLA daemon shutting down");

        // Stop scheduler; a cycle in progress finishes first
        scheduler.stop().await;
        if let Err(e) = scheduler_handle.await {
            tracing::error!(error = %e, "Scheduler task failed");
        }

        Ok(())
    }
}

/// Wire the engine to the configured collaborators
async fn build_engine(config: &DaemonConfig) -> DaemonResult<SlaOrchestrator> {
    let transport: Arc<dyn MailTransport> = match &config.mail {
        MailConfig::Log => Arc::new(LogMailTransport::new()),
        MailConfig::Webhook { url, timeout_secs } => {
            let relay = WebhookMailTransport::new(url.clone(), *timeout_secs)?;
            tracing::info!(url = %relay.url(), "Delivering mail through relay");
            Arc::new(relay)
        }
    };
    let engine_config = config.sla.engine_config();

    let engine = match &config.storage {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; tracking state is lost on restart");
            SlaOrchestrator::new(
                Arc::new(InMemoryTicketStore::new()),
                Arc::new(InMemoryTrackingStore::new()),
                Arc::new(InMemoryDirectory::new()),
                transport,
                engine_config,
            )
        }
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let pool = connect_pool(url, *max_connections, *connect_timeout_secs).await?;
            let helpdesk = Arc::new(PostgresHelpdesk::new(pool.clone()));
            let tracking = Arc::new(PostgresTrackingStore::new(pool).await?);
            tracing::info!("Connected to PostgreSQL");
            SlaOrchestrator::new(helpdesk.clone(), tracking, helpdesk, transport, engine_config)
        }
    };

    Ok(engine)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_server_runs_single_cycle() {
        let server = Server::new(DaemonConfig::default()).await.unwrap();
        let report = server.run_once().await;
        assert!(report.is_clean());
        assert!(report.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_relay_is_wired() {
        let config = DaemonConfig {
            mail: MailConfig::Webhook {
                url: "http://127.0.0.1:9/send".to_string(),
                timeout_secs: 1,
            },
            ..DaemonConfig::default()
        };
        let server = Server::new(config).await.unwrap();
        assert!(server.run_once().await.is_clean());
    }

    #[tokio::test]
    async fn test_out_of_range_config_is_rejected() {
        let mut config = DaemonConfig::default();
        config.sla.grace_period_secs = u64::MAX;
        assert!(matches!(
            Server::new(config).await,
            Err(DaemonError::Config(_))
        ));
    }
}
