//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::api::routes::create_router;
use crate::config::settings::{Settings, StoreBackend};
use crate::db::run_pending_migrations;
use crate::external::publish::ConnectorRegistry;
use crate::jobs::TickScheduler;
use crate::repositories::connect_store;
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
    shutdown: CancellationToken,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the server when cancelled, in addition to Ctrl+C and
    /// SIGTERM.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start the server and run until shutdown signal
    ///
    /// This method:
    /// 1. Logs startup information
    /// 2. Connects the configured store, migrating it when enabled
    /// 3. Builds publish connectors and application state
    /// 4. Starts the in-process tick scheduler when enabled
    /// 5. Serves HTTP until shutdown, then stops the scheduler
    ///
    /// # Errors
    /// - Store connection or migration errors
    /// - Connector configuration errors
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = &self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            "Application starting"
        );

        tracing::info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            keep_alive_timeout = settings.server.keep_alive_timeout,
            "Server configuration loaded"
        );

        tracing::info!(
            backend = ?settings.database.backend,
            max_connections = settings.database.max_connections,
            auto_migrate = settings.database.auto_migrate,
            "Store configuration loaded"
        );

        tracing::info!(
            cron_enabled = settings.cron.enabled,
            cron_secret_configured = settings.cron.secret().is_some(),
            stale_posting_minutes = settings.publishing.stale_posting_minutes,
            "Publishing configuration loaded"
        );

        let (store, _pool) = connect_store(&settings.database).await?;

        if settings.database.backend == StoreBackend::Postgres && settings.database.auto_migrate {
            let applied = run_pending_migrations(&settings.database.url).await?;
            tracing::info!(applied = applied.len(), "Database migrations applied");
        }

        let connectors = ConnectorRegistry::from_settings(&settings.publishing)?;
        tracing::info!(platforms = ?connectors.platforms(), "Publish connectors registered");

        let state = AppState::new(store, connectors, settings);

        let scheduler = if settings.cron.enabled {
            let scheduler =
                TickScheduler::new(state.services.publishing.clone(), settings.cron.clone())
                    .await?;
            scheduler.start().await?;
            Some(scheduler)
        } else {
            tracing::info!("In-process tick scheduler disabled; expecting external triggers");
            None
        };

        let router = create_router(state);

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        tokio::spawn(shutdown_signal(self.shutdown.clone()));

        let shutdown = self.shutdown.clone();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;

        if let Some(scheduler) = scheduler
            && let Err(e) = scheduler.stop().await
        {
            tracing::warn!(error = %e, "Failed to stop tick scheduler");
        }

        served?;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Cancels `token` on Ctrl+C or SIGTERM.
///
/// A signal handler that cannot be installed is logged and ignored; the
/// other signal and the token still work.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
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
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = token.cancelled() => return,
    }

    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_server_stops_when_token_cancelled() {
        let mut settings = Settings::default();
        settings.database.backend = StoreBackend::Memory;
        settings.server.port = 0;

        let server = Server::new(settings);
        let token = server.shutdown_token();
        let handle = tokio::spawn(server.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
