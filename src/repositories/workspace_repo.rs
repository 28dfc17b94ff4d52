use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppResult, DatabaseErrorConverter};
use crate::models::{NewPlatformCredential, NewWorkspace, PlatformCredential, Workspace};
use crate::schema::{platform_credentials, workspaces};

#[derive(Clone)]
pub struct WorkspaceRepository {
    pool: AsyncDbPool,
}

impl WorkspaceRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, workspace: NewWorkspace) -> AppResult<Workspace> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(workspaces::table)
            .values(&workspace)
            .returning(Workspace::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "create workspace"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Workspace>> {
        let mut conn = get_connection(&self.pool).await?;

        workspaces::table
            .find(id)
            .select(Workspace::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find workspace"))
    }

    pub async fn update_policy(&self, id: Uuid, policy: JsonValue) -> AppResult<Option<Workspace>> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(workspaces::table.find(id))
            .set((
                workspaces::scheduling_policy.eq(Some(policy)),
                workspaces::updated_at.eq(Utc::now()),
            ))
            .returning(Workspace::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "update policy"))
    }

    pub async fn upsert_credentials(
        &self,
        credentials: NewPlatformCredential,
    ) -> AppResult<PlatformCredential> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(platform_credentials::table)
            .values(&credentials)
            .on_conflict((
                platform_credentials::workspace_id,
                platform_credentials::platform,
            ))
            .do_update()
            .set((
                platform_credentials::access_token.eq(&credentials.access_token),
                platform_credentials::account_id.eq(&credentials.account_id),
                platform_credentials::updated_at.eq(Utc::now()),
            ))
            .returning(PlatformCredential::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "upsert credentials"))
    }
}
