//! Postgres backend of [`SchedulingStore`], delegating to the per-entity
//! repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel_async::RunQueryDsl;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::store::{
    CancelOutcome, FinalizeOutcome, PairClaim, PublishContext, PublishedPayload, ScheduleFilter,
    SchedulingStore,
};
use super::{ContentRepository, ScheduleRepository, SlotRepository, WorkspaceRepository};
use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppResult, DatabaseErrorConverter};
use crate::models::{
    ContentStatus, Draft, NewDraft, NewPlatformCredential, NewPostDraft, NewSchedule,
    NewSchedulingSlot, NewWorkspace, PlatformCredential, PostDraft, PublishedPost, Schedule,
    SchedulingSlot, Workspace,
};

/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct PgStore {
    pool: AsyncDbPool,
    workspaces: WorkspaceRepository,
    slots: SlotRepository,
    content: ContentRepository,
    schedules: ScheduleRepository,
}

impl PgStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            workspaces: WorkspaceRepository::new(pool.clone()),
            slots: SlotRepository::new(pool.clone()),
            content: ContentRepository::new(pool.clone()),
            schedules: ScheduleRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl SchedulingStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        let mut conn = get_connection(&self.pool).await?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "ping"))?;
        Ok(())
    }

    async fn create_workspace(&self, workspace: NewWorkspace) -> AppResult<Workspace> {
        self.workspaces.create(workspace).await
    }

    async fn find_workspace(&self, id: Uuid) -> AppResult<Option<Workspace>> {
        self.workspaces.find_by_id(id).await
    }

    async fn update_policy(&self, id: Uuid, policy: JsonValue) -> AppResult<Option<Workspace>> {
        self.workspaces.update_policy(id, policy).await
    }

    async fn upsert_credentials(
        &self,
        credentials: NewPlatformCredential,
    ) -> AppResult<PlatformCredential> {
        self.workspaces.upsert_credentials(credentials).await
    }

    async fn insert_slots(&self, slots: Vec<NewSchedulingSlot>) -> AppResult<usize> {
        self.slots.insert_skip_conflicts(slots).await
    }

    async fn count_slots(&self, workspace_id: Uuid, platform: Option<&str>) -> AppResult<i64> {
        self.slots.count(workspace_id, platform).await
    }

    async fn list_open_slots(
        &self,
        workspace_id: Uuid,
        platform: Option<&str>,
        after: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<SchedulingSlot>> {
        self.slots
            .list_open(workspace_id, platform, after, limit)
            .await
    }

    async fn create_post_draft(&self, draft: NewPostDraft) -> AppResult<PostDraft> {
        self.content.create_post_draft(draft).await
    }

    async fn list_post_drafts(
        &self,
        workspace_id: Uuid,
        status: Option<ContentStatus>,
        platform: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<PostDraft>> {
        self.content
            .list_post_drafts(workspace_id, status, platform, limit)
            .await
    }

    async fn create_draft(&self, draft: NewDraft) -> AppResult<Draft> {
        self.content.create_draft(draft).await
    }

    async fn claim_pair(
        &self,
        slot: &SchedulingSlot,
        post_draft_id: Uuid,
    ) -> AppResult<PairClaim> {
        self.schedules.claim_pair(slot, post_draft_id).await
    }

    async fn create_schedule(&self, schedule: NewSchedule) -> AppResult<Schedule> {
        self.schedules.create(schedule).await
    }

    async fn find_schedule(&self, id: Uuid) -> AppResult<Option<Schedule>> {
        self.schedules.find_by_id(id).await
    }

    async fn list_schedules(
        &self,
        filter: ScheduleFilter,
    ) -> AppResult<Vec<(Schedule, Option<PublishedPost>)>> {
        self.schedules.list(filter).await
    }

    async fn confirm_schedule(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Schedule>> {
        self.schedules.confirm(id, now).await
    }

    async fn cancel_schedule(&self, id: Uuid) -> AppResult<CancelOutcome> {
        self.schedules.cancel(id).await
    }

    async fn cleanup_failed(&self, workspace_id: Option<Uuid>) -> AppResult<u64> {
        self.schedules.cleanup_failed(workspace_id).await
    }

    async fn find_due_schedules(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Schedule>> {
        self.schedules.find_due(now, limit).await
    }

    async fn claim_schedule(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> AppResult<Option<Schedule>> {
        self.schedules.claim(id, claimed_at).await
    }

    async fn load_publish_context(&self, schedule: &Schedule) -> AppResult<PublishContext> {
        self.schedules.load_publish_context(schedule).await
    }

    async fn release_schedule(&self, id: Uuid, error_text: &str) -> AppResult<bool> {
        self.schedules.release(id, error_text).await
    }

    async fn fail_schedule(&self, id: Uuid, error_text: &str) -> AppResult<bool> {
        self.schedules.fail(id, error_text).await
    }

    async fn finalize_published(
        &self,
        id: Uuid,
        payload: PublishedPayload,
    ) -> AppResult<FinalizeOutcome> {
        self.schedules.finalize(id, payload).await
    }

    async fn reclaim_stale(&self, cutoff: DateTime<Utc>, error_text: &str) -> AppResult<u64> {
        self.schedules.reclaim_stale(cutoff, error_text).await
    }
}

/// These run only when `SLOTCAST_TEST_DATABASE_URL` points at a disposable
/// Postgres database; each test works in its own workspace.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::DatabaseConfig;
    use crate::db::{establish_async_connection_pool, run_pending_migrations};
    use crate::repositories::store_contract;
    use tokio::sync::OnceCell;

    const DATABASE_URL_VAR: &str = "SLOTCAST_TEST_DATABASE_URL";

    static MIGRATED: OnceCell<()> = OnceCell::const_new();

    async fn test_store() -> Option<PgStore> {
        let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
            eprintln!("{} not set; skipping Postgres store test", DATABASE_URL_VAR);
            return None;
        };
        MIGRATED
            .get_or_init(|| async {
                run_pending_migrations(&url).await.unwrap();
            })
            .await;

        let config = DatabaseConfig {
            url,
            max_connections: 8,
            min_connections: 0,
            ..Default::default()
        };
        let pool = establish_async_connection_pool(&config).await.unwrap();
        Some(PgStore::new(pool))
    }

    #[tokio::test]
    async fn test_pg_finalize_twice_keeps_one_record() {
        let Some(store) = test_store().await else { return };
        store_contract::finalize_twice_keeps_one_record(&store).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pg_sibling_finalizes_settle_content() {
        let Some(store) = test_store().await else { return };
        store_contract::sibling_finalizes_settle_content(&store, 20).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pg_racing_claims_have_one_winner() {
        let Some(store) = test_store().await else { return };
        store_contract::racing_claims_have_one_winner(&store).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pg_concurrent_pairing_books_once() {
        let Some(store) = test_store().await else { return };
        store_contract::concurrent_pairing_books_once(&store).await;
    }

    #[tokio::test]
    async fn test_pg_cleanup_removes_failed_and_releases() {
        let Some(store) = test_store().await else { return };
        store_contract::cleanup_removes_failed_and_releases(&store).await;

        // Unscoped cleanup takes the same lock-and-recheck path.
        store.cleanup_failed(None).await.unwrap();
    }

    #[tokio::test]
    async fn test_pg_ping() {
        let Some(store) = test_store().await else { return };
        store.ping().await.unwrap();
    }
}
