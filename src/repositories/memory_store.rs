//! In-process store backend.
//!
//! Holds every table behind one async mutex, so each trait method is atomic
//! exactly like a database transaction. Used for `database.backend = "memory"`
//! and for tests.

use std::collections::HashMap;
use std::sync::Mutex as SyncMutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{
    CancelOutcome, FinalizeOutcome, PairClaim, PublishContext, PublishedPayload, ScheduleFilter,
    SchedulingStore, cancel_rejection,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    ContentRef, ContentStatus, Draft, NewDraft, NewPlatformCredential, NewPostDraft, NewSchedule,
    NewSchedulingSlot, NewWorkspace, PlatformCredential, PostDraft, PublishedPost, Schedule,
    ScheduleStatus, SchedulingSlot, Workspace,
};

#[derive(Default)]
struct Tables {
    workspaces: Vec<Workspace>,
    credentials: Vec<PlatformCredential>,
    slots: Vec<SchedulingSlot>,
    post_drafts: Vec<PostDraft>,
    drafts: Vec<Draft>,
    schedules: Vec<Schedule>,
    published: Vec<PublishedPost>,
}

impl Tables {
    fn schedule_mut(&mut self, id: Uuid) -> Option<&mut Schedule> {
        self.schedules.iter_mut().find(|s| s.id == id)
    }

    fn post_draft_mut(&mut self, id: Uuid) -> Option<&mut PostDraft> {
        self.post_drafts.iter_mut().find(|d| d.id == id)
    }

    fn published_for(&self, schedule_id: Uuid) -> Option<&PublishedPost> {
        self.published.iter().find(|p| p.schedule_id == schedule_id)
    }

    fn release_slot(&mut self, slot_id: Option<Uuid>, content_id: Option<Uuid>) {
        let Some(slot_id) = slot_id else { return };
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == slot_id) {
            if content_id.is_none() || slot.assigned_content_id == content_id {
                slot.assigned_content_id = None;
            }
        }
    }

    fn reset_post_draft(&mut self, id: Option<Uuid>, now: DateTime<Utc>) {
        let Some(id) = id else { return };
        if let Some(draft) = self.post_draft_mut(id) {
            if matches!(
                draft.status,
                ContentStatus::TempScheduled | ContentStatus::Confirmed
            ) {
                draft.status = ContentStatus::Generated;
                draft.temp_scheduled_at = None;
                draft.confirmed_at = None;
                draft.updated_at = now;
            }
        }
    }

    fn has_pending_sibling(&self, schedule: &Schedule) -> bool {
        self.schedules.iter().any(|other| {
            other.id != schedule.id
                && other.status.is_pending()
                && match schedule.content_ref() {
                    Some(ContentRef::PostDraft(id)) => other.post_draft_id == Some(id),
                    Some(ContentRef::Draft(id)) => other.draft_id == Some(id),
                    None => false,
                }
        })
    }

    fn is_due(&self, schedule: &Schedule, now: DateTime<Utc>) -> bool {
        if schedule.status != ScheduleStatus::Waiting || schedule.scheduled_at > now {
            return false;
        }
        schedule.is_confirmed
            || schedule.draft_id.is_some_and(|id| {
                self.drafts
                    .iter()
                    .any(|draft| draft.id == id && draft.is_confirmed())
            })
    }
}

/// Store backend keeping all rows in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    faults: SyncMutex<HashMap<&'static str, u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` calls of `operation` fail with a transient
    /// connectivity error before touching any row.
    #[cfg(test)]
    pub fn inject_transient(&self, operation: &'static str, times: u32) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(operation, times);
        }
    }

    fn check_fault(&self, operation: &'static str) -> AppResult<()> {
        let Ok(mut faults) = self.faults.lock() else {
            return Ok(());
        };
        match faults.get_mut(operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(AppError::Unavailable {
                    operation: operation.to_string(),
                    source: anyhow::anyhow!("server closed the connection unexpectedly"),
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.check_fault("ping")
    }

    async fn create_workspace(&self, workspace: NewWorkspace) -> AppResult<Workspace> {
        self.check_fault("create_workspace")?;
        let mut tables = self.tables.lock().await;
        if tables.workspaces.iter().any(|w| w.id == workspace.id) {
            return Err(AppError::Duplicate {
                entity: "workspace".to_string(),
                field: "id".to_string(),
                value: workspace.id.to_string(),
            });
        }
        let now = Utc::now();
        let row = Workspace {
            id: workspace.id,
            name: workspace.name,
            scheduling_policy: workspace.scheduling_policy,
            created_at: now,
            updated_at: now,
        };
        tables.workspaces.push(row.clone());
        Ok(row)
    }

    async fn find_workspace(&self, id: Uuid) -> AppResult<Option<Workspace>> {
        self.check_fault("find_workspace")?;
        let tables = self.tables.lock().await;
        Ok(tables.workspaces.iter().find(|w| w.id == id).cloned())
    }

    async fn update_policy(&self, id: Uuid, policy: JsonValue) -> AppResult<Option<Workspace>> {
        self.check_fault("update_policy")?;
        let mut tables = self.tables.lock().await;
        Ok(tables.workspaces.iter_mut().find(|w| w.id == id).map(|w| {
            w.scheduling_policy = Some(policy);
            w.updated_at = Utc::now();
            w.clone()
        }))
    }

    async fn upsert_credentials(
        &self,
        credentials: NewPlatformCredential,
    ) -> AppResult<PlatformCredential> {
        self.check_fault("upsert_credentials")?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        if let Some(existing) = tables.credentials.iter_mut().find(|c| {
            c.workspace_id == credentials.workspace_id && c.platform == credentials.platform
        }) {
            existing.access_token = credentials.access_token;
            existing.account_id = credentials.account_id;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let row = PlatformCredential {
            id: credentials.id,
            workspace_id: credentials.workspace_id,
            platform: credentials.platform,
            access_token: credentials.access_token,
            account_id: credentials.account_id,
            created_at: now,
            updated_at: now,
        };
        tables.credentials.push(row.clone());
        Ok(row)
    }

    async fn insert_slots(&self, slots: Vec<NewSchedulingSlot>) -> AppResult<usize> {
        self.check_fault("insert_slots")?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let mut created = 0;
        for slot in slots {
            let exists = tables.slots.iter().any(|s| {
                s.workspace_id == slot.workspace_id
                    && s.platform == slot.platform
                    && s.scheduled_at == slot.scheduled_at
            });
            if exists {
                continue;
            }
            tables.slots.push(SchedulingSlot {
                id: slot.id,
                workspace_id: slot.workspace_id,
                platform: slot.platform,
                scheduled_at: slot.scheduled_at,
                assigned_content_id: None,
                created_at: now,
            });
            created += 1;
        }
        Ok(created)
    }

    async fn count_slots(&self, workspace_id: Uuid, platform: Option<&str>) -> AppResult<i64> {
        self.check_fault("count_slots")?;
        let tables = self.tables.lock().await;
        let count = tables
            .slots
            .iter()
            .filter(|s| s.workspace_id == workspace_id)
            .filter(|s| platform.is_none_or(|p| s.platform == p))
            .count();
        Ok(count as i64)
    }

    async fn list_open_slots(
        &self,
        workspace_id: Uuid,
        platform: Option<&str>,
        after: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<SchedulingSlot>> {
        self.check_fault("list_open_slots")?;
        let tables = self.tables.lock().await;
        let mut open: Vec<SchedulingSlot> = tables
            .slots
            .iter()
            .filter(|s| s.workspace_id == workspace_id && s.assigned_content_id.is_none())
            .filter(|s| s.scheduled_at > after)
            .filter(|s| platform.is_none_or(|p| s.platform == p))
            .cloned()
            .collect();
        open.sort_by_key(|s| s.scheduled_at);
        open.truncate(limit.max(0) as usize);
        Ok(open)
    }

    async fn create_post_draft(&self, draft: NewPostDraft) -> AppResult<PostDraft> {
        self.check_fault("create_post_draft")?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let row = PostDraft {
            id: draft.id,
            workspace_id: draft.workspace_id,
            platform: draft.platform,
            body: draft.body,
            thread_replies: draft.thread_replies,
            status: ContentStatus::Generated,
            temp_scheduled_at: None,
            confirmed_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.post_drafts.push(row.clone());
        Ok(row)
    }

    async fn list_post_drafts(
        &self,
        workspace_id: Uuid,
        status: Option<ContentStatus>,
        platform: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<PostDraft>> {
        self.check_fault("list_post_drafts")?;
        let tables = self.tables.lock().await;
        // Insertion order breaks created_at ties.
        let mut drafts: Vec<PostDraft> = tables
            .post_drafts
            .iter()
            .filter(|d| d.workspace_id == workspace_id)
            .filter(|d| status.is_none_or(|status| d.status == status))
            .filter(|d| platform.is_none_or(|p| d.platform == p))
            .cloned()
            .collect();
        drafts.sort_by_key(|d| d.created_at);
        drafts.truncate(limit.max(0) as usize);
        Ok(drafts)
    }

    async fn create_draft(&self, draft: NewDraft) -> AppResult<Draft> {
        self.check_fault("create_draft")?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let row = Draft {
            id: draft.id,
            workspace_id: draft.workspace_id,
            body: draft.body,
            formatted: draft.formatted,
            status: draft.status,
            confirmed_at: draft.confirmed_at,
            created_at: now,
            updated_at: now,
        };
        tables.drafts.push(row.clone());
        Ok(row)
    }

    async fn claim_pair(
        &self,
        slot: &SchedulingSlot,
        post_draft_id: Uuid,
    ) -> AppResult<PairClaim> {
        self.check_fault("claim_pair")?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        let Some(row) = tables
            .slots
            .iter_mut()
            .find(|s| s.id == slot.id && s.assigned_content_id.is_none())
        else {
            return Ok(PairClaim::SlotTaken);
        };
        row.assigned_content_id = Some(post_draft_id);

        if tables.schedules.iter().any(|s| s.slot_id == Some(slot.id)) {
            tables.release_slot(Some(slot.id), Some(post_draft_id));
            return Ok(PairClaim::SlotConsumed);
        }

        match tables.post_draft_mut(post_draft_id) {
            Some(draft) if draft.status == ContentStatus::Generated => {
                draft.status = ContentStatus::TempScheduled;
                draft.temp_scheduled_at = Some(slot.scheduled_at);
                draft.updated_at = now;
            }
            _ => {
                tables.release_slot(Some(slot.id), Some(post_draft_id));
                return Ok(PairClaim::ContentTaken);
            }
        }

        let new = NewSchedule::for_slot(
            slot.workspace_id,
            &slot.platform,
            slot.scheduled_at,
            slot.id,
            post_draft_id,
        );
        let schedule = schedule_row(new, now);
        tables.schedules.push(schedule.clone());
        Ok(PairClaim::Scheduled(schedule))
    }

    async fn create_schedule(&self, schedule: NewSchedule) -> AppResult<Schedule> {
        self.check_fault("create_schedule")?;
        if schedule.draft_id.is_some() && schedule.post_draft_id.is_some() {
            return Err(AppError::validation(
                "schedules_single_source",
                "a schedule references at most one content source",
            ));
        }
        let mut tables = self.tables.lock().await;
        let row = schedule_row(schedule, Utc::now());
        tables.schedules.push(row.clone());
        Ok(row)
    }

    async fn find_schedule(&self, id: Uuid) -> AppResult<Option<Schedule>> {
        self.check_fault("find_schedule")?;
        let tables = self.tables.lock().await;
        Ok(tables.schedules.iter().find(|s| s.id == id).cloned())
    }

    async fn list_schedules(
        &self,
        filter: ScheduleFilter,
    ) -> AppResult<Vec<(Schedule, Option<PublishedPost>)>> {
        self.check_fault("list_schedules")?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<Schedule> = tables
            .schedules
            .iter()
            .filter(|s| filter.workspace_id.is_none_or(|id| s.workspace_id == id))
            .filter(|s| filter.status.is_none_or(|status| s.status == status))
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.scheduled_at);
        rows.truncate(filter.limit.max(0) as usize);
        Ok(rows
            .into_iter()
            .map(|s| {
                let published = tables.published_for(s.id).cloned();
                (s, published)
            })
            .collect())
    }

    async fn confirm_schedule(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Schedule>> {
        self.check_fault("confirm_schedule")?;
        let mut tables = self.tables.lock().await;
        let Some(schedule) = tables
            .schedule_mut(id)
            .filter(|s| s.status == ScheduleStatus::Waiting && !s.is_confirmed)
        else {
            return Ok(None);
        };
        schedule.is_confirmed = true;
        schedule.updated_at = now;
        let confirmed = schedule.clone();

        if let Some(draft_id) = confirmed.post_draft_id {
            if let Some(draft) = tables
                .post_draft_mut(draft_id)
                .filter(|d| d.status == ContentStatus::TempScheduled)
            {
                draft.status = ContentStatus::Confirmed;
                draft.confirmed_at = Some(now);
                draft.updated_at = now;
            }
        }
        Ok(Some(confirmed))
    }

    async fn cancel_schedule(&self, id: Uuid) -> AppResult<CancelOutcome> {
        self.check_fault("cancel_schedule")?;
        let mut tables = self.tables.lock().await;
        let Some(schedule) = tables.schedules.iter().find(|s| s.id == id).cloned() else {
            return Ok(CancelOutcome::NotFound);
        };
        if let Some(reason) = cancel_rejection(&schedule, tables.published_for(id).is_some()) {
            return Ok(CancelOutcome::Rejected(reason));
        }

        let now = Utc::now();
        tables.schedules.retain(|s| s.id != id);
        tables.release_slot(schedule.slot_id, schedule.post_draft_id);
        tables.reset_post_draft(schedule.post_draft_id, now);
        Ok(CancelOutcome::Cancelled)
    }

    async fn cleanup_failed(&self, workspace_id: Option<Uuid>) -> AppResult<u64> {
        self.check_fault("cleanup_failed")?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let doomed: Vec<Schedule> = tables
            .schedules
            .iter()
            .filter(|s| s.status == ScheduleStatus::Failed)
            .filter(|s| workspace_id.is_none_or(|id| s.workspace_id == id))
            .filter(|s| tables.published_for(s.id).is_none())
            .cloned()
            .collect();

        for schedule in &doomed {
            tables.schedules.retain(|s| s.id != schedule.id);
            tables.release_slot(schedule.slot_id, schedule.post_draft_id);
            tables.reset_post_draft(schedule.post_draft_id, now);
        }
        Ok(doomed.len() as u64)
    }

    async fn find_due_schedules(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Schedule>> {
        self.check_fault("find_due_schedules")?;
        let tables = self.tables.lock().await;
        let mut due: Vec<Schedule> = tables
            .schedules
            .iter()
            .filter(|s| tables.is_due(s, now))
            .cloned()
            .collect();
        due.sort_by_key(|s| s.scheduled_at);
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn claim_schedule(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> AppResult<Option<Schedule>> {
        self.check_fault("claim_schedule")?;
        let mut tables = self.tables.lock().await;
        let Some(schedule) = tables.schedule_mut(id) else {
            return Ok(None);
        };
        match schedule.status {
            ScheduleStatus::Waiting => {
                schedule.status = ScheduleStatus::Posting;
                schedule.claimed_at = Some(claimed_at);
                schedule.attempt_count += 1;
                schedule.updated_at = claimed_at;
                Ok(Some(schedule.clone()))
            }
            ScheduleStatus::Posting if schedule.claimed_at == Some(claimed_at) => {
                Ok(Some(schedule.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn load_publish_context(&self, schedule: &Schedule) -> AppResult<PublishContext> {
        self.check_fault("load_publish_context")?;
        let tables = self.tables.lock().await;
        Ok(PublishContext {
            post_draft: schedule
                .post_draft_id
                .and_then(|id| tables.post_drafts.iter().find(|d| d.id == id).cloned()),
            draft: schedule
                .draft_id
                .and_then(|id| tables.drafts.iter().find(|d| d.id == id).cloned()),
            credentials: tables
                .credentials
                .iter()
                .find(|c| {
                    c.workspace_id == schedule.workspace_id && c.platform == schedule.platform
                })
                .cloned(),
        })
    }

    async fn release_schedule(&self, id: Uuid, error_text: &str) -> AppResult<bool> {
        self.check_fault("release_schedule")?;
        let mut tables = self.tables.lock().await;
        match tables
            .schedule_mut(id)
            .filter(|s| s.status == ScheduleStatus::Posting)
        {
            Some(schedule) => {
                schedule.status = ScheduleStatus::Waiting;
                schedule.error_text = Some(error_text.to_string());
                schedule.claimed_at = None;
                schedule.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn fail_schedule(&self, id: Uuid, error_text: &str) -> AppResult<bool> {
        self.check_fault("fail_schedule")?;
        let mut tables = self.tables.lock().await;
        match tables
            .schedule_mut(id)
            .filter(|s| s.status == ScheduleStatus::Posting)
        {
            Some(schedule) => {
                schedule.status = ScheduleStatus::Failed;
                schedule.error_text = Some(error_text.to_string());
                schedule.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn finalize_published(
        &self,
        id: Uuid,
        payload: PublishedPayload,
    ) -> AppResult<FinalizeOutcome> {
        self.check_fault("finalize_published")?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        let Some(schedule) = tables.schedules.iter().find(|s| s.id == id).cloned() else {
            return Err(AppError::not_found("schedule", id));
        };
        if let Some(existing) = tables.published_for(id).cloned() {
            return Ok(FinalizeOutcome::AlreadyPublished(existing));
        }
        if schedule.status != ScheduleStatus::Posting {
            return Err(AppError::conflict(format!(
                "schedule {} is {}, expected posting",
                id, schedule.status
            )));
        }

        let record = PublishedPost {
            id: Uuid::new_v4(),
            schedule_id: id,
            platform: payload.platform,
            external_post_id: payload.external_post_id,
            raw: payload.raw,
            created_at: now,
        };
        tables.published.push(record.clone());

        if let Some(row) = tables.schedule_mut(id) {
            row.status = ScheduleStatus::Posted;
            row.error_text = None;
            row.updated_at = now;
        }

        let aggregate = if tables.has_pending_sibling(&schedule) {
            ContentStatus::Posting
        } else {
            ContentStatus::Posted
        };
        match schedule.content_ref() {
            Some(ContentRef::PostDraft(draft_id)) => {
                if let Some(draft) = tables.post_draft_mut(draft_id) {
                    draft.status = aggregate;
                    draft.updated_at = now;
                }
            }
            Some(ContentRef::Draft(draft_id)) => {
                if let Some(draft) = tables.drafts.iter_mut().find(|d| d.id == draft_id) {
                    draft.status = aggregate;
                    draft.updated_at = now;
                }
            }
            None => {}
        }

        Ok(FinalizeOutcome::Published(record))
    }

    async fn reclaim_stale(&self, cutoff: DateTime<Utc>, error_text: &str) -> AppResult<u64> {
        self.check_fault("reclaim_stale")?;
        let mut tables = self.tables.lock().await;
        let published: Vec<Uuid> = tables.published.iter().map(|p| p.schedule_id).collect();
        let now = Utc::now();
        let mut reclaimed = 0;
        for schedule in tables.schedules.iter_mut().filter(|s| {
            s.status == ScheduleStatus::Posting
                && s.claimed_at.is_some_and(|at| at < cutoff)
                && !published.contains(&s.id)
        }) {
            schedule.status = ScheduleStatus::Waiting;
            schedule.error_text = Some(error_text.to_string());
            schedule.claimed_at = None;
            schedule.updated_at = now;
            reclaimed += 1;
        }
        Ok(reclaimed)
    }
}

fn schedule_row(new: NewSchedule, now: DateTime<Utc>) -> Schedule {
    Schedule {
        id: new.id,
        workspace_id: new.workspace_id,
        platform: new.platform,
        scheduled_at: new.scheduled_at,
        status: new.status,
        is_confirmed: new.is_confirmed,
        error_text: None,
        slot_id: new.slot_id,
        draft_id: new.draft_id,
        post_draft_id: new.post_draft_id,
        post_text: new.post_text,
        claimed_at: None,
        attempt_count: 0,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::store_contract;
    use chrono::Duration;
    use serde_json::json;

    async fn seed_workspace(store: &MemoryStore) -> Uuid {
        let id = Uuid::new_v4();
        store
            .create_workspace(NewWorkspace {
                id,
                name: "acme".to_string(),
                scheduling_policy: None,
            })
            .await
            .unwrap();
        id
    }

    fn slot(workspace_id: Uuid, platform: &str, at: DateTime<Utc>) -> NewSchedulingSlot {
        NewSchedulingSlot {
            id: Uuid::new_v4(),
            workspace_id,
            platform: platform.to_string(),
            scheduled_at: at,
        }
    }

    fn post_draft(workspace_id: Uuid, platform: &str) -> NewPostDraft {
        NewPostDraft {
            id: Uuid::new_v4(),
            workspace_id,
            platform: platform.to_string(),
            body: "hello".to_string(),
            thread_replies: json!([]),
        }
    }

    #[tokio::test]
    async fn test_insert_slots_skips_conflicts() {
        let store = MemoryStore::new();
        let ws = seed_workspace(&store).await;
        let at = Utc::now() + Duration::hours(1);

        let created = store
            .insert_slots(vec![slot(ws, "threads", at), slot(ws, "threads", at)])
            .await
            .unwrap();
        assert_eq!(created, 1);

        let again = store.insert_slots(vec![slot(ws, "threads", at)]).await.unwrap();
        assert_eq!(again, 0);
        assert_eq!(store.count_slots(ws, None).await.unwrap(), 1);
        assert_eq!(store.count_slots(ws, Some("x")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_claim_pair_rejects_taken_slot() {
        let store = MemoryStore::new();
        let ws = seed_workspace(&store).await;
        store
            .insert_slots(vec![slot(ws, "threads", Utc::now() + Duration::hours(1))])
            .await
            .unwrap();
        let open = store
            .list_open_slots(ws, None, Utc::now(), 10)
            .await
            .unwrap();
        let first = store.create_post_draft(post_draft(ws, "threads")).await.unwrap();
        let second = store.create_post_draft(post_draft(ws, "threads")).await.unwrap();

        let claimed = store.claim_pair(&open[0], first.id).await.unwrap();
        assert!(matches!(claimed, PairClaim::Scheduled(_)));

        let stale = store.claim_pair(&open[0], second.id).await.unwrap();
        assert_eq!(stale, PairClaim::SlotTaken);
    }

    #[tokio::test]
    async fn test_claim_pair_releases_slot_when_content_taken() {
        let store = MemoryStore::new();
        let ws = seed_workspace(&store).await;
        store
            .insert_slots(vec![
                slot(ws, "threads", Utc::now() + Duration::hours(1)),
                slot(ws, "threads", Utc::now() + Duration::hours(2)),
            ])
            .await
            .unwrap();
        let open = store
            .list_open_slots(ws, None, Utc::now(), 10)
            .await
            .unwrap();
        let draft = store.create_post_draft(post_draft(ws, "threads")).await.unwrap();

        store.claim_pair(&open[0], draft.id).await.unwrap();
        let outcome = store.claim_pair(&open[1], draft.id).await.unwrap();

        assert_eq!(outcome, PairClaim::ContentTaken);
        let still_open = store
            .list_open_slots(ws, None, Utc::now(), 10)
            .await
            .unwrap();
        assert_eq!(still_open.len(), 1);
        assert_eq!(still_open[0].id, open[1].id);
    }

    #[tokio::test]
    async fn test_claim_schedule_is_exclusive() {
        let store = MemoryStore::new();
        let ws = seed_workspace(&store).await;
        let schedule = store
            .create_schedule(NewSchedule {
                id: Uuid::new_v4(),
                workspace_id: ws,
                platform: "threads".to_string(),
                scheduled_at: Utc::now(),
                status: ScheduleStatus::Waiting,
                is_confirmed: true,
                slot_id: None,
                draft_id: None,
                post_draft_id: None,
                post_text: Some("hi".to_string()),
            })
            .await
            .unwrap();

        let mine = Utc::now();
        let other = mine + Duration::seconds(1);

        let first = store.claim_schedule(schedule.id, mine).await.unwrap();
        assert_eq!(first.unwrap().status, ScheduleStatus::Posting);
        assert!(store.claim_schedule(schedule.id, other).await.unwrap().is_none());
        // Re-entering the same claim is allowed.
        let again = store.claim_schedule(schedule.id, mine).await.unwrap().unwrap();
        assert_eq!(again.attempt_count, 1);
    }

    #[tokio::test]
    async fn test_racing_claims_have_one_winner() {
        let store = MemoryStore::new();
        let ws = seed_workspace(&store).await;
        let schedule = store
            .create_schedule(NewSchedule {
                id: Uuid::new_v4(),
                workspace_id: ws,
                platform: "threads".to_string(),
                scheduled_at: Utc::now(),
                status: ScheduleStatus::Waiting,
                is_confirmed: true,
                slot_id: None,
                draft_id: None,
                post_draft_id: None,
                post_text: Some("hi".to_string()),
            })
            .await
            .unwrap();

        let base = Utc::now();
        let claims = (0..8).map(|i| {
            let store = &store;
            async move {
                store
                    .claim_schedule(schedule.id, base + Duration::milliseconds(i))
                    .await
                    .unwrap()
            }
        });
        let outcomes = futures::future::join_all(claims).await;

        assert_eq!(outcomes.iter().filter(|o| o.is_some()).count(), 1);
    }

    #[tokio::test]
    async fn test_injected_fault_is_transient_and_consumed() {
        let store = MemoryStore::new();
        store.inject_transient("ping", 1);

        let err = store.ping().await.unwrap_err();
        assert!(err.is_transient());
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_reclaim_stale_skips_fresh_claims() {
        let store = MemoryStore::new();
        let ws = seed_workspace(&store).await;
        let mut ids = Vec::new();
        for _ in 0..2 {
            let schedule = store
                .create_schedule(NewSchedule {
                    id: Uuid::new_v4(),
                    workspace_id: ws,
                    platform: "threads".to_string(),
                    scheduled_at: Utc::now(),
                    status: ScheduleStatus::Waiting,
                    is_confirmed: true,
                    slot_id: None,
                    draft_id: None,
                    post_draft_id: None,
                    post_text: Some("hi".to_string()),
                })
                .await
                .unwrap();
            ids.push(schedule.id);
        }
        let now = Utc::now();
        store
            .claim_schedule(ids[0], now - Duration::hours(2))
            .await
            .unwrap();
        store.claim_schedule(ids[1], now).await.unwrap();

        let reclaimed = store
            .reclaim_stale(now - Duration::minutes(30), "reclaimed")
            .await
            .unwrap();

        assert_eq!(reclaimed, 1);
        let stale = store.find_schedule(ids[0]).await.unwrap().unwrap();
        assert_eq!(stale.status, ScheduleStatus::Waiting);
        let fresh = store.find_schedule(ids[1]).await.unwrap().unwrap();
        assert_eq!(fresh.status, ScheduleStatus::Posting);
    }

    #[tokio::test]
    async fn test_finalize_twice_keeps_one_record() {
        let store = MemoryStore::new();
        store_contract::finalize_twice_keeps_one_record(&store).await;
        assert_eq!(store.tables.lock().await.published.len(), 1);
    }

    #[tokio::test]
    async fn test_sibling_finalizes_settle_content() {
        store_contract::sibling_finalizes_settle_content(&MemoryStore::new(), 3).await;
    }

    #[tokio::test]
    async fn test_concurrent_pairing_books_once() {
        store_contract::concurrent_pairing_books_once(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_cleanup_removes_failed_and_releases() {
        store_contract::cleanup_removes_failed_and_releases(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_cleanup_without_workspace_spans_all() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let ws = seed_workspace(&store).await;
            let schedule = store
                .create_schedule(NewSchedule {
                    id: Uuid::new_v4(),
                    workspace_id: ws,
                    platform: "threads".to_string(),
                    scheduled_at: Utc::now(),
                    status: ScheduleStatus::Waiting,
                    is_confirmed: true,
                    slot_id: None,
                    draft_id: None,
                    post_draft_id: None,
                    post_text: Some("hi".to_string()),
                })
                .await
                .unwrap();
            store.claim_schedule(schedule.id, Utc::now()).await.unwrap();
            store.fail_schedule(schedule.id, "boom").await.unwrap();
            ids.push(schedule.id);
        }

        assert_eq!(store.cleanup_failed(None).await.unwrap(), 2);
        for id in ids {
            assert!(store.find_schedule(id).await.unwrap().is_none());
        }
    }
}
