use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Record of a successful external publication, at most one per schedule.
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, utoipa::ToSchema)]
#[diesel(table_name = crate::schema::published_posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PublishedPost {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub platform: String,
    pub external_post_id: String,
    #[schema(value_type = Option<Object>)]
    pub raw: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::published_posts)]
pub struct NewPublishedPost {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub platform: String,
    pub external_post_id: String,
    pub raw: Option<JsonValue>,
}
