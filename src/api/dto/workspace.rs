//! Workspace, policy and credential DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{PlatformCredential, SchedulingPolicy, Workspace};
use crate::services::PolicyView;

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    #[schema(example = "Marketing")]
    pub name: String,

    #[serde(alias = "scheduling_policy")]
    pub scheduling_policy: Option<SchedulingPolicy>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkspaceResponse {
    pub id: Uuid,
    pub name: String,
    pub policy_configured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Workspace> for WorkspaceResponse {
    fn from(workspace: Workspace) -> Self {
        Self {
            policy_configured: workspace.policy().is_some(),
            id: workspace.id,
            name: workspace.name,
            created_at: workspace.created_at,
            updated_at: workspace.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyResponse {
    pub workspace_id: Uuid,
    /// False when the stored policy is missing or unreadable
    pub configured: bool,
    pub policy: Option<SchedulingPolicy>,
}

impl From<PolicyView> for PolicyResponse {
    fn from(view: PolicyView) -> Self {
        Self {
            workspace_id: view.workspace_id,
            configured: view.configured,
            policy: view.policy,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,

    #[validate(length(min = 1, max = 255, message = "Account id must be between 1 and 255 characters"))]
    #[schema(example = "17841400000000000")]
    pub account_id: String,
}

/// Stored credentials without the token.
#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialsResponse {
    pub workspace_id: Uuid,
    pub platform: String,
    pub account_id: String,
    pub updated_at: DateTime<Utc>,
}

impl From<PlatformCredential> for CredentialsResponse {
    fn from(credentials: PlatformCredential) -> Self {
        Self {
            workspace_id: credentials.workspace_id,
            platform: credentials.platform,
            account_id: credentials.account_id,
            updated_at: credentials.updated_at,
        }
    }
}
