//! Due-schedule processing: claim, publish, finalize.

mod text;
mod tick;

pub use text::{EMPTY_TEXT, PostBody, resolve};
pub use tick::{TickOutcome, TickReport, TickResult};

use crate::config::{MAX_TICK_LIMIT, PublishingConfig};
use crate::external::publish::ConnectorRegistry;
use crate::repositories::SharedStore;

/// Error text left on schedules reverted by the stale-claim sweep.
pub const STALE_RECLAIM_TEXT: &str = "reclaimed after stale posting claim";

pub const DEFAULT_TICK_LIMIT: i64 = 20;

/// Runs ticks against the shared store and the configured connectors.
#[derive(Clone)]
pub struct PublishingService {
    store: SharedStore,
    connectors: ConnectorRegistry,
    config: PublishingConfig,
}

impl PublishingService {
    pub fn new(store: SharedStore, connectors: ConnectorRegistry, config: PublishingConfig) -> Self {
        Self {
            store,
            connectors,
            config,
        }
    }

    pub fn connectors(&self) -> &ConnectorRegistry {
        &self.connectors
    }
}

/// Clamps a requested tick size into `1..=MAX_TICK_LIMIT`.
pub fn tick_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_TICK_LIMIT)
        .clamp(1, MAX_TICK_LIMIT)
}
