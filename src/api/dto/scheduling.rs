//! Slot generation and assignment DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::services::scheduling::SlotGenerationReport;

/// Request body for `POST /api/scheduling/slots/generate`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSlotsRequest {
    #[serde(alias = "workspace_id")]
    pub workspace_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateSlotsResponse {
    /// Slots inserted by this call
    #[schema(example = 14)]
    pub created: usize,
    /// Candidate slots before existing ones were skipped
    #[schema(example = 14)]
    pub requested: usize,
}

impl From<SlotGenerationReport> for GenerateSlotsResponse {
    fn from(report: SlotGenerationReport) -> Self {
        Self {
            created: report.created,
            requested: report.requested,
        }
    }
}

/// Request body for `POST /api/scheduling/assign`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({"workspaceId": "7d3c1f6e-5d0a-4b8e-9b7e-1f2a3b4c5d6e", "platform": "threads", "limit": 10}))]
pub struct AssignRequest {
    #[serde(alias = "workspace_id")]
    pub workspace_id: Uuid,

    #[validate(length(min = 1, max = 64, message = "Platform must be between 1 and 64 characters"))]
    pub platform: Option<String>,

    #[validate(range(min = 1, message = "Limit must be at least 1"))]
    pub limit: Option<i64>,
}
