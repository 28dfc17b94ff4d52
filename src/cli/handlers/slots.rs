//! Slots command handler

use uuid::Uuid;

use super::{connect_services, print_json};
use crate::config::settings::Settings;
use crate::error::AppResult;

pub struct SlotsCommandHandler {
    config: Settings,
}

impl SlotsCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Expands the workspace policy into slots and prints the counts.
    pub async fn generate(&self, workspace_id: Uuid) -> AppResult<()> {
        let services = connect_services(&self.config).await?;
        let report = services.scheduling.generate_slots(workspace_id).await?;
        print_json(&report)
    }
}
