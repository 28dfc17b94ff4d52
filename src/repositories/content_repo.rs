use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppResult, DatabaseErrorConverter};
use crate::models::{ContentStatus, Draft, NewDraft, NewPostDraft, PostDraft};
use crate::schema::{drafts, post_drafts};

/// Content pool items and legacy drafts.
#[derive(Clone)]
pub struct ContentRepository {
    pool: AsyncDbPool,
}

impl ContentRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create_post_draft(&self, draft: NewPostDraft) -> AppResult<PostDraft> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(post_drafts::table)
            .values(&draft)
            .returning(PostDraft::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "create post draft"))
    }

    pub async fn list_post_drafts(
        &self,
        workspace_id: Uuid,
        status: Option<ContentStatus>,
        platform: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<PostDraft>> {
        let mut conn = get_connection(&self.pool).await?;

        let mut query = post_drafts::table
            .filter(post_drafts::workspace_id.eq(workspace_id))
            .select(PostDraft::as_select())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(post_drafts::status.eq(status));
        }
        if let Some(platform) = platform {
            query = query.filter(post_drafts::platform.eq(platform));
        }

        query
            .order((post_drafts::created_at.asc(), post_drafts::id.asc()))
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list post drafts"))
    }

    pub async fn create_draft(&self, draft: NewDraft) -> AppResult<Draft> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(drafts::table)
            .values(&draft)
            .returning(Draft::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "create draft"))
    }
}
