//! Repository layer for data access operations.
//!
//! The services only see the [`SchedulingStore`] trait object; the backend
//! is chosen once at startup from `database.backend`.

mod content_repo;
mod memory_store;
mod pg_store;
mod schedule_repo;
mod slot_repo;
mod store;
#[cfg(test)]
mod store_contract;
mod workspace_repo;

pub use content_repo::ContentRepository;
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use schedule_repo::ScheduleRepository;
pub use slot_repo::SlotRepository;
pub use store::{
    CancelOutcome, FinalizeOutcome, PairClaim, PublishContext, PublishedPayload, ScheduleFilter,
    SchedulingStore,
};
pub use workspace_repo::WorkspaceRepository;

use std::sync::Arc;

use crate::config::settings::{DatabaseConfig, StoreBackend};
use crate::db::{AsyncDbPool, establish_async_connection_pool};
use crate::error::AppResult;

/// Shared handle to the configured store.
pub type SharedStore = Arc<dyn SchedulingStore>;

/// Builds the store selected by `database.backend`.
///
/// Returns the pool alongside the store for the Postgres backend so callers
/// can run migrations on it.
pub async fn connect_store(config: &DatabaseConfig) -> AppResult<(SharedStore, Option<AsyncDbPool>)> {
    match config.backend {
        StoreBackend::Postgres => {
            let pool = establish_async_connection_pool(config).await?;
            tracing::info!(
                max_connections = config.max_connections,
                "Connected to PostgreSQL store"
            );
            Ok((Arc::new(PgStore::new(pool.clone())), Some(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok((Arc::new(MemoryStore::new()), None))
        }
    }
}
