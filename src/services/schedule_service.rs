//! Schedule service: listing, confirmation, cancellation and cleanup.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{PublishedPost, Schedule, ScheduleStatus};
use crate::repositories::{CancelOutcome, ScheduleFilter, SharedStore};

const MAX_LIST_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct ScheduleService {
    store: SharedStore,
}

impl ScheduleService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Lists schedules soonest first, each with its published record.
    pub async fn list_schedules(
        &self,
        workspace_id: Option<Uuid>,
        status: Option<ScheduleStatus>,
        limit: Option<i64>,
    ) -> AppResult<Vec<(Schedule, Option<PublishedPost>)>> {
        self.store
            .list_schedules(ScheduleFilter {
                workspace_id,
                status,
                limit: limit.unwrap_or(100).clamp(1, MAX_LIST_LIMIT),
            })
            .await
    }

    pub async fn get_schedule(&self, id: Uuid) -> AppResult<Schedule> {
        self.store
            .find_schedule(id)
            .await?
            .ok_or_else(|| AppError::not_found("schedule", id))
    }

    /// Confirms a waiting schedule so the tick will publish it.
    ///
    /// Confirming twice, or confirming a schedule that already left
    /// `waiting`, is a conflict.
    pub async fn confirm(&self, id: Uuid) -> AppResult<Schedule> {
        if let Some(schedule) = self.store.confirm_schedule(id, Utc::now()).await? {
            tracing::info!(schedule_id = %id, "Schedule confirmed");
            return Ok(schedule);
        }

        let current = self.get_schedule(id).await?;
        if current.is_confirmed {
            Err(AppError::conflict("schedule is already confirmed"))
        } else {
            Err(AppError::conflict(format!(
                "only waiting schedules can be confirmed (status is {})",
                current.status
            )))
        }
    }

    /// Deletes a waiting content-pool schedule and releases its slot and
    /// content item.
    pub async fn cancel(&self, id: Uuid) -> AppResult<()> {
        match self.store.cancel_schedule(id).await? {
            CancelOutcome::Cancelled => {
                tracing::info!(schedule_id = %id, "Schedule cancelled");
                Ok(())
            }
            CancelOutcome::NotFound => Err(AppError::not_found("schedule", id)),
            CancelOutcome::Rejected(reason) => Err(AppError::conflict(reason)),
        }
    }

    /// Removes failed schedules that never published. Returns how many.
    pub async fn cleanup_failed(&self, workspace_id: Option<Uuid>) -> AppResult<u64> {
        let removed = self.store.cleanup_failed(workspace_id).await?;
        tracing::info!(removed = removed, "Cleaned up failed schedules");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulingConfig;
    use crate::models::{ContentStatus, NewPostDraft, NewSchedule, NewWorkspace};
    use crate::repositories::{MemoryStore, SchedulingStore};
    use crate::services::SchedulingService;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        schedules: ScheduleService,
        workspace_id: Uuid,
        post_draft_id: Uuid,
        schedule_id: Uuid,
    }

    /// One future slot paired with one pool item.
    async fn assigned() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let day = (Utc::now() + Duration::days(3)).date_naive();
        let workspace = store
            .create_workspace(NewWorkspace {
                id: Uuid::new_v4(),
                name: "schedules".to_string(),
                scheduling_policy: Some(json!({
                    "timezone": "UTC",
                    "startDate": day.to_string(),
                    "endDate": day.to_string(),
                    "dailyPostLimit": {"threads": 1},
                    "coreTimeWindows": [{
                        "daysOfWeek": [0, 1, 2, 3, 4, 5, 6],
                        "startTime": "10:00",
                        "endTime": "11:00"
                    }]
                })),
            })
            .await
            .unwrap();
        let item = store
            .create_post_draft(NewPostDraft {
                id: Uuid::new_v4(),
                workspace_id: workspace.id,
                platform: "threads".to_string(),
                body: "hello".to_string(),
                thread_replies: json!([]),
            })
            .await
            .unwrap();

        let scheduling = SchedulingService::new(store.clone(), SchedulingConfig::default());
        scheduling.generate_slots(workspace.id).await.unwrap();
        let report = scheduling.assign(workspace.id, None, None).await.unwrap();
        let schedule_id = report.results[0].schedule_id.unwrap();

        Fixture {
            schedules: ScheduleService::new(store.clone()),
            store,
            workspace_id: workspace.id,
            post_draft_id: item.id,
            schedule_id,
        }
    }

    impl Fixture {
        async fn item_status(&self) -> ContentStatus {
            self.store
                .list_post_drafts(self.workspace_id, None, None, 10)
                .await
                .unwrap()
                .into_iter()
                .find(|d| d.id == self.post_draft_id)
                .unwrap()
                .status
        }

        async fn open_slots(&self) -> usize {
            self.store
                .list_open_slots(self.workspace_id, None, Utc::now(), 10)
                .await
                .unwrap()
                .len()
        }
    }

    #[tokio::test]
    async fn test_confirm_once() {
        let fixture = assigned().await;

        let confirmed = fixture.schedules.confirm(fixture.schedule_id).await.unwrap();
        assert!(confirmed.is_confirmed);
        assert_eq!(fixture.item_status().await, ContentStatus::Confirmed);

        let err = fixture.schedules.confirm(fixture.schedule_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let err = fixture.schedules.confirm(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_releases_slot_and_content() {
        let fixture = assigned().await;
        assert_eq!(fixture.open_slots().await, 0);

        fixture.schedules.cancel(fixture.schedule_id).await.unwrap();

        assert_eq!(fixture.open_slots().await, 1);
        assert_eq!(fixture.item_status().await, ContentStatus::Generated);
        let err = fixture.schedules.cancel(fixture.schedule_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_rejects_posting_and_legacy() {
        let fixture = assigned().await;
        fixture.schedules.confirm(fixture.schedule_id).await.unwrap();
        fixture
            .store
            .claim_schedule(fixture.schedule_id, Utc::now())
            .await
            .unwrap();

        let err = fixture.schedules.cancel(fixture.schedule_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let legacy = fixture
            .store
            .create_schedule(NewSchedule {
                id: Uuid::new_v4(),
                workspace_id: fixture.workspace_id,
                platform: "threads".to_string(),
                scheduled_at: Utc::now(),
                status: ScheduleStatus::Waiting,
                is_confirmed: false,
                slot_id: None,
                draft_id: Some(Uuid::new_v4()),
                post_draft_id: None,
                post_text: None,
            })
            .await
            .unwrap();
        let err = fixture.schedules.cancel(legacy.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_cleanup_failed_releases_pool() {
        let fixture = assigned().await;
        fixture.schedules.confirm(fixture.schedule_id).await.unwrap();
        fixture
            .store
            .claim_schedule(fixture.schedule_id, Utc::now())
            .await
            .unwrap();
        fixture
            .store
            .fail_schedule(fixture.schedule_id, "provider responded 400: bad")
            .await
            .unwrap();

        let failed = fixture
            .schedules
            .list_schedules(Some(fixture.workspace_id), Some(ScheduleStatus::Failed), None)
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);

        let removed = fixture
            .schedules
            .cleanup_failed(Some(fixture.workspace_id))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(fixture.open_slots().await, 1);
        assert_eq!(fixture.item_status().await, ContentStatus::Generated);
        assert!(
            fixture
                .schedules
                .list_schedules(Some(fixture.workspace_id), None, None)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
