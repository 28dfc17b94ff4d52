//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use crate::config::{CronConfig, Settings};
use crate::external::publish::ConnectorRegistry;
use crate::repositories::SharedStore;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap: the store and the connectors sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the store, used by health checks
    pub store: SharedStore,
    /// Cron trigger settings, including the optional shared secret
    pub cron: CronConfig,
}

impl AppState {
    /// Wires every service onto one store and one set of connectors.
    ///
    /// # Example
    /// ```ignore
    /// let (store, _pool) = connect_store(&settings.database).await?;
    /// let connectors = ConnectorRegistry::from_settings(&settings.publishing)?;
    /// let state = AppState::new(store, connectors, &settings);
    /// ```
    pub fn new(store: SharedStore, connectors: ConnectorRegistry, settings: &Settings) -> Self {
        let services = Services::new(store.clone(), connectors, settings);
        Self {
            services,
            store,
            cron: settings.cron.clone(),
        }
    }
}
