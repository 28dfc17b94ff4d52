use serde::Serialize;
use uuid::Uuid;

use super::SchedulingService;
use super::time_windows::expand;
use crate::error::{AppError, AppResult};
use crate::models::NewSchedulingSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotGenerationReport {
    /// Rows actually inserted.
    pub created: usize,
    /// Candidate rows before skipping existing (workspace, platform, time).
    pub requested: usize,
}

impl SchedulingService {
    /// Expands the workspace's stored policy and inserts the resulting slots.
    ///
    /// Re-running with an unchanged policy creates nothing.
    pub async fn generate_slots(&self, workspace_id: Uuid) -> AppResult<SlotGenerationReport> {
        let workspace = self.workspace(workspace_id).await?;
        let policy = workspace.policy().ok_or_else(|| {
            AppError::validation(
                "scheduling_policy",
                "workspace has no valid scheduling policy configured",
            )
        })?;
        policy.validate(self.config.max_range_days)?;

        let candidates = expand(&policy, workspace_id)?;
        let requested = candidates.len();
        if requested == 0 {
            tracing::info!(
                workspace_id = %workspace_id,
                "Policy produced no slots (no matching windows or zero limits)"
            );
            return Ok(SlotGenerationReport {
                created: 0,
                requested: 0,
            });
        }

        let rows = candidates
            .into_iter()
            .map(|slot| NewSchedulingSlot {
                id: Uuid::new_v4(),
                workspace_id,
                platform: slot.platform,
                scheduled_at: slot.scheduled_at,
            })
            .collect();
        let created = self.store.insert_slots(rows).await?;

        tracing::info!(
            workspace_id = %workspace_id,
            created = created,
            requested = requested,
            "Generated scheduling slots"
        );

        Ok(SlotGenerationReport { created, requested })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulingConfig;
    use crate::models::NewWorkspace;
    use crate::repositories::{MemoryStore, SchedulingStore, SharedStore};
    use serde_json::json;
    use std::sync::Arc;

    async fn service_with_policy(policy: Option<serde_json::Value>) -> (SchedulingService, Uuid) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let workspace = store
            .create_workspace(NewWorkspace {
                id: Uuid::new_v4(),
                name: "ops".to_string(),
                scheduling_policy: policy,
            })
            .await
            .unwrap();
        (
            SchedulingService::new(store, SchedulingConfig::default()),
            workspace.id,
        )
    }

    fn monday_policy() -> serde_json::Value {
        json!({
            "timezone": "UTC",
            "startDate": "2025-01-06",
            "endDate": "2025-01-06",
            "dailyPostLimit": {"X": 2},
            "coreTimeWindows": [{"daysOfWeek": [1], "startTime": "08:00", "endTime": "10:00"}],
            "minIntervalMinutes": 30,
            "randomJitterMinutes": 0
        })
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let (service, workspace_id) = service_with_policy(Some(monday_policy())).await;

        let first = service.generate_slots(workspace_id).await.unwrap();
        assert_eq!(
            first,
            SlotGenerationReport {
                created: 2,
                requested: 2
            }
        );

        let second = service.generate_slots(workspace_id).await.unwrap();
        assert_eq!(
            second,
            SlotGenerationReport {
                created: 0,
                requested: 2
            }
        );
        assert_eq!(service.store.count_slots(workspace_id, None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_generate_without_policy_is_validation_error() {
        let (service, workspace_id) = service_with_policy(None).await;

        let err = service.generate_slots(workspace_id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_generate_no_matching_days_creates_nothing() {
        let mut policy = monday_policy();
        policy["coreTimeWindows"][0]["daysOfWeek"] = json!([0]);
        let (service, workspace_id) = service_with_policy(Some(policy)).await;

        let report = service.generate_slots(workspace_id).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.requested, 0);
    }

    #[tokio::test]
    async fn test_generate_unknown_workspace() {
        let (service, _) = service_with_policy(None).await;
        let err = service.generate_slots(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
