use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::SchedulingPolicy;

/// Workspace model for reading from database
#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::workspaces)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub scheduling_policy: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Stored policy, parsed leniently. Missing or malformed JSON yields `None`.
    pub fn policy(&self) -> Option<SchedulingPolicy> {
        SchedulingPolicy::from_stored(self.scheduling_policy.as_ref())
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::workspaces)]
pub struct NewWorkspace {
    pub id: Uuid,
    pub name: String,
    pub scheduling_policy: Option<JsonValue>,
}

/// Workspace-level publish credentials for one platform
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::platform_credentials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlatformCredential {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub access_token: String,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlatformCredential {
    /// Returns publish credentials when both the token and the account id
    /// are present.
    pub fn usable(&self) -> Option<PublishCredentials> {
        let access_token = self.access_token.trim();
        let account_id = self.account_id.trim();
        if access_token.is_empty() || account_id.is_empty() {
            return None;
        }
        Some(PublishCredentials {
            access_token: access_token.to_string(),
            account_id: account_id.to_string(),
        })
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::platform_credentials)]
pub struct NewPlatformCredential {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub access_token: String,
    pub account_id: String,
}

/// What a publish connector needs to act on behalf of a workspace.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishCredentials {
    pub access_token: String,
    pub account_id: String,
}

impl std::fmt::Debug for PublishCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishCredentials")
            .field("access_token", &"***")
            .field("account_id", &self.account_id)
            .finish()
    }
}
