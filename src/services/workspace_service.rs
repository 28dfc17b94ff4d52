//! Workspace service: workspaces, their scheduling policy and publish
//! credentials.

use serde::Serialize;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewPlatformCredential, NewWorkspace, PlatformCredential, SchedulingPolicy, Workspace,
};
use crate::repositories::SharedStore;

/// Stored policy as the API reports it.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyView {
    pub workspace_id: Uuid,
    /// False when nothing usable is stored.
    pub configured: bool,
    pub policy: Option<SchedulingPolicy>,
}

#[derive(Clone)]
pub struct WorkspaceService {
    store: SharedStore,
    config: SchedulingConfig,
}

impl WorkspaceService {
    pub fn new(store: SharedStore, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    /// Creates a workspace, optionally with an initial policy.
    ///
    /// # Arguments
    /// * `name` - Display name, must not be blank
    /// * `policy` - Validated strictly before anything is stored
    pub async fn create_workspace(
        &self,
        name: &str,
        policy: Option<SchedulingPolicy>,
    ) -> AppResult<Workspace> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "name must not be empty"));
        }
        let scheduling_policy = match policy {
            Some(policy) => {
                policy.validate(self.config.max_range_days)?;
                Some(policy.to_stored()?)
            }
            None => None,
        };

        let workspace = self
            .store
            .create_workspace(NewWorkspace {
                id: Uuid::new_v4(),
                name: name.to_string(),
                scheduling_policy,
            })
            .await?;
        tracing::info!(workspace_id = %workspace.id, "Created workspace");
        Ok(workspace)
    }

    /// Gets a workspace by id, or `NotFound`.
    pub async fn get_workspace(&self, id: Uuid) -> AppResult<Workspace> {
        self.store
            .find_workspace(id)
            .await?
            .ok_or_else(|| AppError::not_found("workspace", id))
    }

    /// Reads the stored policy leniently; an unusable value reports
    /// `configured = false` instead of failing.
    pub async fn get_policy(&self, id: Uuid) -> AppResult<PolicyView> {
        let workspace = self.get_workspace(id).await?;
        let policy = workspace.policy();
        Ok(PolicyView {
            workspace_id: workspace.id,
            configured: policy.is_some(),
            policy,
        })
    }

    /// Validates and replaces the workspace policy.
    pub async fn put_policy(&self, id: Uuid, policy: SchedulingPolicy) -> AppResult<PolicyView> {
        policy.validate(self.config.max_range_days)?;
        let workspace = self
            .store
            .update_policy(id, policy.to_stored()?)
            .await?
            .ok_or_else(|| AppError::not_found("workspace", id))?;

        tracing::info!(
            workspace_id = %id,
            start_date = %policy.start_date,
            end_date = %policy.end_date,
            "Updated scheduling policy"
        );
        Ok(PolicyView {
            workspace_id: workspace.id,
            configured: true,
            policy: Some(policy),
        })
    }

    /// Stores publish credentials for one platform, replacing earlier ones.
    pub async fn put_credentials(
        &self,
        workspace_id: Uuid,
        platform: &str,
        access_token: &str,
        account_id: &str,
    ) -> AppResult<PlatformCredential> {
        self.get_workspace(workspace_id).await?;

        let platform = platform.trim();
        if platform.is_empty() {
            return Err(AppError::validation("platform", "platform must not be empty"));
        }
        if access_token.trim().is_empty() {
            return Err(AppError::validation(
                "access_token",
                "access token must not be empty",
            ));
        }
        if account_id.trim().is_empty() {
            return Err(AppError::validation("account_id", "account id must not be empty"));
        }

        self.store
            .upsert_credentials(NewPlatformCredential {
                id: Uuid::new_v4(),
                workspace_id,
                platform: platform.to_string(),
                access_token: access_token.trim().to_string(),
                account_id: account_id.trim().to_string(),
            })
            .await
    }
}
