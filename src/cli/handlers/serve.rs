//! Serve command handler
//!
//! Handles the serve command's dry-run; actual startup lives in
//! [`crate::server::Server`].

use crate::config::settings::{Settings, StoreBackend};
use crate::error::AppResult;
use crate::external::publish::ConnectorRegistry;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Validates configuration and connector wiring without binding or
    /// connecting to the database.
    pub async fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());

        match self.config.database.backend {
            StoreBackend::Postgres => println!(
                "✓ PostgreSQL store configured (auto_migrate = {})",
                self.config.database.auto_migrate
            ),
            StoreBackend::Memory => println!("✓ In-memory store configured"),
        }

        let connectors = ConnectorRegistry::from_settings(&self.config.publishing)?;
        println!("✓ Publish connectors: {}", connectors.platforms().join(", "));

        if self.config.cron.enabled {
            println!("✓ In-process tick scheduler: {}", self.config.cron.expression);
        } else {
            println!("✓ Ticks are triggered externally via /api/cron/tick");
        }
        if self.config.cron.secret().is_none() {
            println!("! No cron secret configured; the tick endpoint is open");
        }

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
