use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publish-intent lifecycle.
///
/// `waiting -> posting` only through a conditional claim; `posted` and
/// `failed` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum, utoipa::ToSchema,
)]
#[db_enum(existing_type_path = "crate::schema::sql_types::ScheduleStatus")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Waiting,
    Posting,
    Posted,
    Failed,
}

impl ScheduleStatus {
    /// Waiting or posting: the schedule may still reach the provider.
    pub fn is_pending(self) -> bool {
        matches!(self, ScheduleStatus::Waiting | ScheduleStatus::Posting)
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleStatus::Waiting => write!(f, "waiting"),
            ScheduleStatus::Posting => write!(f, "posting"),
            ScheduleStatus::Posted => write!(f, "posted"),
            ScheduleStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Schedule query model
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Schedule {
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
    pub post_text: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub attempt_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Content source of a schedule. A schedule references at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRef {
    /// Legacy single-draft flow
    Draft(Uuid),
    /// Content pool flow
    PostDraft(Uuid),
}

impl Schedule {
    pub fn content_ref(&self) -> Option<ContentRef> {
        match (self.post_draft_id, self.draft_id) {
            (Some(id), _) => Some(ContentRef::PostDraft(id)),
            (None, Some(id)) => Some(ContentRef::Draft(id)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::schedules)]
pub struct NewSchedule {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub is_confirmed: bool,
    pub slot_id: Option<Uuid>,
    pub draft_id: Option<Uuid>,
    pub post_draft_id: Option<Uuid>,
    pub post_text: Option<String>,
}

impl NewSchedule {
    /// Unconfirmed waiting schedule linking a claimed slot to a content-pool item.
    pub fn for_slot(
        workspace_id: Uuid,
        platform: &str,
        scheduled_at: DateTime<Utc>,
        slot_id: Uuid,
        post_draft_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            platform: platform.to_string(),
            scheduled_at,
            status: ScheduleStatus::Waiting,
            is_confirmed: false,
            slot_id: Some(slot_id),
            draft_id: None,
            post_draft_id: Some(post_draft_id),
            post_text: None,
        }
    }
}
