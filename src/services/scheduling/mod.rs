//! Slot generation and slot-to-content assignment.

mod assigner;
mod slots;
pub mod time_windows;

pub use assigner::{AssignOutcome, AssignReason, AssignReport, AssignResult, AssignDiagnostics};
pub use slots::SlotGenerationReport;
pub use time_windows::{ExpandedSlot, expand};

use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::error::{AppError, AppResult};
use crate::models::Workspace;
use crate::repositories::SharedStore;

/// Turns workspace policies into slots and pairs slots with pooled content.
#[derive(Clone)]
pub struct SchedulingService {
    store: SharedStore,
    config: SchedulingConfig,
}

impl SchedulingService {
    pub fn new(store: SharedStore, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    async fn workspace(&self, id: Uuid) -> AppResult<Workspace> {
        self.store
            .find_workspace(id)
            .await?
            .ok_or_else(|| AppError::not_found("workspace", id))
    }
}
