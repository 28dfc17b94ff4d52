//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! the store and handlers.

mod content_service;
pub mod publishing;
mod schedule_service;
pub mod scheduling;
mod workspace_service;

pub use content_service::ContentService;
pub use publishing::PublishingService;
pub use schedule_service::ScheduleService;
pub use scheduling::SchedulingService;
pub use workspace_service::{PolicyView, WorkspaceService};

use crate::config::Settings;
use crate::external::publish::ConnectorRegistry;
use crate::repositories::SharedStore;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since the store is shared behind an `Arc`.
#[derive(Clone)]
pub struct Services {
    pub workspaces: WorkspaceService,
    pub content: ContentService,
    pub scheduling: SchedulingService,
    pub schedules: ScheduleService,
    pub publishing: PublishingService,
}

impl Services {
    /// Creates every service over one shared store.
    pub fn new(store: SharedStore, connectors: ConnectorRegistry, settings: &Settings) -> Self {
        Self {
            workspaces: WorkspaceService::new(store.clone(), settings.scheduling.clone()),
            content: ContentService::new(store.clone()),
            scheduling: SchedulingService::new(store.clone(), settings.scheduling.clone()),
            schedules: ScheduleService::new(store.clone()),
            publishing: PublishingService::new(store, connectors, settings.publishing.clone()),
        }
    }
}
