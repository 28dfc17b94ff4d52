//! Command handlers for CLI operations
//!
//! This module contains handlers for different CLI commands,
//! separating command execution logic from parsing and validation.

pub mod migrate;
pub mod serve;
pub mod slots;
pub mod tick;

pub use migrate::MigrateCommandHandler;
pub use serve::ServeCommandHandler;
pub use slots::SlotsCommandHandler;
pub use tick::TickCommandHandler;

use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::external::publish::ConnectorRegistry;
use crate::repositories::connect_store;
use crate::services::Services;

/// Builds the service layer for one-shot commands.
async fn connect_services(settings: &Settings) -> AppResult<Services> {
    settings.database.validate()?;
    let (store, _pool) = connect_store(&settings.database).await?;
    let connectors = ConnectorRegistry::from_settings(&settings.publishing)?;
    Ok(Services::new(store, connectors, settings))
}

fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })?;
    println!("{}", rendered);
    Ok(())
}
