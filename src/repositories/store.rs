//! Storage seam for the scheduling pipeline.
//!
//! Every method is one atomic unit against the backing store. State-machine
//! fields are only ever changed by conditional updates guarded by the
//! expected prior state, so concurrent callers in other processes observe
//! "zero rows affected" instead of lost updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    ContentStatus, Draft, NewDraft, NewPlatformCredential, NewPostDraft, NewSchedule,
    NewSchedulingSlot, NewWorkspace, PlatformCredential, PostDraft, PublishedPost, Schedule,
    ScheduleStatus, SchedulingSlot, Workspace,
};

/// Result of one slot/content pairing attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PairClaim {
    /// Slot claimed, content moved to TEMP_SCHEDULED, waiting schedule created.
    Scheduled(Schedule),
    /// Another caller claimed the slot first.
    SlotTaken,
    /// The slot is already referenced by a schedule; the claim was released.
    SlotConsumed,
    /// The content item left GENERATED before it could be scheduled; the
    /// slot claim was released.
    ContentTaken,
}

/// Rows a schedule's publish attempt needs.
#[derive(Debug, Clone, Default)]
pub struct PublishContext {
    pub post_draft: Option<PostDraft>,
    pub draft: Option<Draft>,
    pub credentials: Option<PlatformCredential>,
}

/// Provider result persisted on success.
#[derive(Debug, Clone)]
pub struct PublishedPayload {
    pub platform: String,
    pub external_post_id: String,
    pub raw: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    /// The record was written by this call.
    Published(PublishedPost),
    /// A record already existed; nothing was changed.
    AlreadyPublished(PublishedPost),
}

impl FinalizeOutcome {
    pub fn record(&self) -> &PublishedPost {
        match self {
            FinalizeOutcome::Published(record) | FinalizeOutcome::AlreadyPublished(record) => {
                record
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
    /// The schedule exists but may not be cancelled, with the reason.
    Rejected(String),
}

/// Filters for schedule listings.
#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub workspace_id: Option<Uuid>,
    pub status: Option<ScheduleStatus>,
    pub limit: i64,
}

/// Why a schedule may not be cancelled, if it may not.
pub(crate) fn cancel_rejection(schedule: &Schedule, published: bool) -> Option<String> {
    if published {
        return Some("schedule has already been published".to_string());
    }
    if schedule.status != ScheduleStatus::Waiting {
        return Some(format!(
            "only waiting schedules can be cancelled (status is {})",
            schedule.status
        ));
    }
    if schedule.post_draft_id.is_none() {
        return Some("legacy draft schedules cannot be cancelled here".to_string());
    }
    None
}

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> AppResult<()>;

    // Workspaces

    async fn create_workspace(&self, workspace: NewWorkspace) -> AppResult<Workspace>;

    async fn find_workspace(&self, id: Uuid) -> AppResult<Option<Workspace>>;

    async fn update_policy(&self, id: Uuid, policy: JsonValue) -> AppResult<Option<Workspace>>;

    /// Inserts or replaces the credentials for (workspace, platform).
    async fn upsert_credentials(
        &self,
        credentials: NewPlatformCredential,
    ) -> AppResult<PlatformCredential>;

    // Slots

    /// Inserts slots, skipping rows that collide on
    /// (workspace, platform, scheduled_at). Returns the number created.
    async fn insert_slots(&self, slots: Vec<NewSchedulingSlot>) -> AppResult<usize>;

    async fn count_slots(&self, workspace_id: Uuid, platform: Option<&str>) -> AppResult<i64>;

    /// Unclaimed slots after `after`, oldest first.
    async fn list_open_slots(
        &self,
        workspace_id: Uuid,
        platform: Option<&str>,
        after: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<SchedulingSlot>>;

    // Content

    async fn create_post_draft(&self, draft: NewPostDraft) -> AppResult<PostDraft>;

    /// Content-pool items, oldest first.
    async fn list_post_drafts(
        &self,
        workspace_id: Uuid,
        status: Option<ContentStatus>,
        platform: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<PostDraft>>;

    async fn create_draft(&self, draft: NewDraft) -> AppResult<Draft>;

    // Assignment

    /// Claims `slot` for the content item and creates its waiting schedule.
    async fn claim_pair(&self, slot: &SchedulingSlot, post_draft_id: Uuid)
    -> AppResult<PairClaim>;

    // Schedules

    async fn create_schedule(&self, schedule: NewSchedule) -> AppResult<Schedule>;

    async fn find_schedule(&self, id: Uuid) -> AppResult<Option<Schedule>>;

    /// Schedules, soonest first, with their published record when present.
    async fn list_schedules(
        &self,
        filter: ScheduleFilter,
    ) -> AppResult<Vec<(Schedule, Option<PublishedPost>)>>;

    /// `is_confirmed: false -> true` while waiting; the linked content item
    /// moves TEMP_SCHEDULED -> CONFIRMED. `None` when the guard did not match.
    async fn confirm_schedule(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Schedule>>;

    /// Deletes a waiting, unpublished content-pool schedule and releases its
    /// slot and content item.
    async fn cancel_schedule(&self, id: Uuid) -> AppResult<CancelOutcome>;

    /// Deletes failed schedules without a published record, releasing their
    /// slots and content items. Returns the number removed.
    async fn cleanup_failed(&self, workspace_id: Option<Uuid>) -> AppResult<u64>;

    // Tick

    /// Waiting schedules due at `now` that are confirmed (directly or through
    /// a confirmed legacy draft), oldest first.
    async fn find_due_schedules(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Schedule>>;

    /// `waiting -> posting`. A row already in `posting` with the same
    /// `claimed_at` is returned as well, so a caller can re-enter its own
    /// claim. `None` means someone else owns it or the state moved on.
    async fn claim_schedule(&self, id: Uuid, claimed_at: DateTime<Utc>)
    -> AppResult<Option<Schedule>>;

    async fn load_publish_context(&self, schedule: &Schedule) -> AppResult<PublishContext>;

    /// `posting -> waiting` with `error_text`. Returns false if the guard did
    /// not match.
    async fn release_schedule(&self, id: Uuid, error_text: &str) -> AppResult<bool>;

    /// `posting -> failed` with `error_text`. Returns false if the guard did
    /// not match.
    async fn fail_schedule(&self, id: Uuid, error_text: &str) -> AppResult<bool>;

    /// Upserts the published record keyed by schedule id, marks the schedule
    /// posted, and recomputes the content item's aggregate status.
    async fn finalize_published(
        &self,
        id: Uuid,
        payload: PublishedPayload,
    ) -> AppResult<FinalizeOutcome>;

    /// Reverts unpublished schedules stuck in `posting` since before `cutoff`.
    async fn reclaim_stale(&self, cutoff: DateTime<Utc>, error_text: &str) -> AppResult<u64>;
}
