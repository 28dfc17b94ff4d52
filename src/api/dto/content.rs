//! Content pool DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{ContentStatus, PostDraft};

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "workspaceId": "7d3c1f6e-5d0a-4b8e-9b7e-1f2a3b4c5d6e",
    "platform": "threads",
    "body": "Launch day!",
    "threadReplies": ["Details below", "Sign up today"]
}))]
pub struct CreatePostDraftRequest {
    #[serde(alias = "workspace_id")]
    pub workspace_id: Uuid,

    #[validate(length(min = 1, max = 64, message = "Platform must be between 1 and 64 characters"))]
    pub platform: String,

    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,

    #[serde(default, alias = "thread_replies")]
    pub thread_replies: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct ListPostDraftsQuery {
    pub workspace_id: Uuid,
    pub status: Option<ContentStatus>,
    pub platform: Option<String>,
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostDraftResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub body: String,
    pub thread_replies: Vec<String>,
    pub status: ContentStatus,
    pub temp_scheduled_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PostDraft> for PostDraftResponse {
    fn from(draft: PostDraft) -> Self {
        Self {
            thread_replies: draft.replies(),
            id: draft.id,
            workspace_id: draft.workspace_id,
            platform: draft.platform,
            body: draft.body,
            status: draft.status,
            temp_scheduled_at: draft.temp_scheduled_at,
            confirmed_at: draft.confirmed_at,
            created_at: draft.created_at,
        }
    }
}
