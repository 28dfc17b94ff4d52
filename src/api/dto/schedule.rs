//! Schedule DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{PublishedPost, Schedule, ScheduleStatus};

#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct ListSchedulesQuery {
    pub workspace_id: Option<Uuid>,
    pub status: Option<ScheduleStatus>,
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    #[param(minimum = 1, maximum = 500, example = 100)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct CleanupQuery {
    /// Restrict the cleanup to one workspace
    pub workspace_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupResponse {
    #[schema(example = 3)]
    pub deleted: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub is_confirmed: bool,
    pub error_text: Option<String>,
    pub slot_id: Option<Uuid>,
    pub draft_id: Option<Uuid>,
    pub post_draft_id: Option<Uuid>,
    pub attempt_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishedPost>,
}

impl From<(Schedule, Option<PublishedPost>)> for ScheduleResponse {
    fn from((schedule, published): (Schedule, Option<PublishedPost>)) -> Self {
        Self {
            id: schedule.id,
            workspace_id: schedule.workspace_id,
            platform: schedule.platform,
            scheduled_at: schedule.scheduled_at,
            status: schedule.status,
            is_confirmed: schedule.is_confirmed,
            error_text: schedule.error_text,
            slot_id: schedule.slot_id,
            draft_id: schedule.draft_id,
            post_draft_id: schedule.post_draft_id,
            attempt_count: schedule.attempt_count,
            created_at: schedule.created_at,
            updated_at: schedule.updated_at,
            published,
        }
    }
}

impl From<Schedule> for ScheduleResponse {
    fn from(schedule: Schedule) -> Self {
        Self::from((schedule, None))
    }
}
