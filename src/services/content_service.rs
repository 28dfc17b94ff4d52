//! Content pool service.

use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ContentStatus, NewPostDraft, PostDraft};
use crate::repositories::SharedStore;

#[derive(Clone)]
pub struct ContentService {
    store: SharedStore,
}

impl ContentService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Adds a GENERATED item to the workspace's content pool.
    ///
    /// # Arguments
    /// * `replies` - Optional thread replies, published after `body` in order
    pub async fn create_post_draft(
        &self,
        workspace_id: Uuid,
        platform: &str,
        body: &str,
        replies: Vec<String>,
    ) -> AppResult<PostDraft> {
        self.store
            .find_workspace(workspace_id)
            .await?
            .ok_or_else(|| AppError::not_found("workspace", workspace_id))?;

        let platform = platform.trim();
        if platform.is_empty() {
            return Err(AppError::validation("platform", "platform must not be empty"));
        }
        if body.trim().is_empty() {
            return Err(AppError::validation("body", "body must not be empty"));
        }

        let replies: Vec<JsonValue> = replies
            .into_iter()
            .map(|reply| reply.trim().to_string())
            .filter(|reply| !reply.is_empty())
            .map(JsonValue::String)
            .collect();

        self.store
            .create_post_draft(NewPostDraft {
                id: Uuid::new_v4(),
                workspace_id,
                platform: platform.to_string(),
                body: body.to_string(),
                thread_replies: JsonValue::Array(replies),
            })
            .await
    }

    /// Lists pool items, oldest first.
    pub async fn list_post_drafts(
        &self,
        workspace_id: Uuid,
        status: Option<ContentStatus>,
        platform: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<PostDraft>> {
        self.store
            .list_post_drafts(workspace_id, status, platform, limit.clamp(1, 500))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewWorkspace;
    use crate::repositories::{MemoryStore, SchedulingStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_and_filter_pool() {
        let store = Arc::new(MemoryStore::new());
        let workspace = store
            .create_workspace(NewWorkspace {
                id: Uuid::new_v4(),
                name: "pool".to_string(),
                scheduling_policy: None,
            })
            .await
            .unwrap();
        let service = ContentService::new(store.clone());

        let item = service
            .create_post_draft(
                workspace.id,
                "threads",
                "hello",
                vec!["  ".to_string(), "reply".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(item.status, ContentStatus::Generated);
        assert_eq!(item.replies(), vec!["reply".to_string()]);

        service
            .create_post_draft(workspace.id, "x", "other", Vec::new())
            .await
            .unwrap();

        let threads = service
            .list_post_drafts(workspace.id, Some(ContentStatus::Generated), Some("threads"), 10)
            .await
            .unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, item.id);
    }

    #[tokio::test]
    async fn test_rejects_blank_body_and_unknown_workspace() {
        let store = Arc::new(MemoryStore::new());
        let service = ContentService::new(store.clone());

        let err = service
            .create_post_draft(Uuid::new_v4(), "threads", "hi", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let workspace = store
            .create_workspace(NewWorkspace {
                id: Uuid::new_v4(),
                name: "pool".to_string(),
                scheduling_policy: None,
            })
            .await
            .unwrap();
        let err = service
            .create_post_draft(workspace.id, "threads", "   ", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
