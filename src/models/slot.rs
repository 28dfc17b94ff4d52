use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// A generated candidate publish timestamp for one platform.
///
/// `assigned_content_id` is set when the assigner claims the slot and reset to
/// `None` when the resulting schedule is cancelled or cleaned up.
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::scheduling_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SchedulingSlot {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub scheduled_at: DateTime<Utc>,
    pub assigned_content_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::scheduling_slots)]
pub struct NewSchedulingSlot {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub scheduled_at: DateTime<Utc>,
}
