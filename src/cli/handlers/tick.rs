//! Tick command handler
//!
//! Runs one tick against the configured store, for crontab-driven deployments
//! that do not keep the server running.

use super::{connect_services, print_json};
use crate::config::settings::Settings;
use crate::error::AppResult;

pub struct TickCommandHandler {
    config: Settings,
}

impl TickCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Processes due schedules and prints the report as JSON.
    pub async fn execute(&self, limit: Option<i64>) -> AppResult<()> {
        let services = connect_services(&self.config).await?;
        let report = services.publishing.tick(limit).await?;

        tracing::info!(
            found = report.found,
            processed = report.processed,
            failed = report.failed,
            "Tick finished"
        );
        print_json(&report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;

    #[tokio::test]
    async fn test_tick_on_empty_memory_store() {
        let mut config = Settings::default();
        config.database.backend = StoreBackend::Memory;

        let result = TickCommandHandler::new(config).execute(Some(5)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_tick_requires_database_url() {
        let result = TickCommandHandler::new(Settings::default()).execute(None).await;
        assert!(result.is_err());
    }
}
