//! Schedule persistence, including the multi-row transactions of the
//! assignment, tick and cancellation flows.
//!
//! Every state change is a guarded update (`... WHERE status = <expected>`);
//! the affected row count tells the caller whether it won.

use chrono::{DateTime, Utc};
use diesel::dsl::{exists, not};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use super::store::{
    CancelOutcome, FinalizeOutcome, PairClaim, PublishContext, PublishedPayload, ScheduleFilter,
    cancel_rejection,
};
use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{
    ContentRef, ContentStatus, Draft, NewPublishedPost, NewSchedule, PlatformCredential,
    PostDraft, PublishedPost, Schedule, ScheduleStatus, SchedulingSlot,
};
use crate::schema::{
    drafts, platform_credentials, post_drafts, published_posts, schedules, scheduling_slots,
};

#[derive(Clone)]
pub struct ScheduleRepository {
    pool: AsyncDbPool,
}

impl ScheduleRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, schedule: NewSchedule) -> AppResult<Schedule> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(schedules::table)
            .values(&schedule)
            .returning(Schedule::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "create schedule"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Schedule>> {
        let mut conn = get_connection(&self.pool).await?;

        schedules::table
            .find(id)
            .select(Schedule::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find schedule"))
    }

    pub async fn list(
        &self,
        filter: ScheduleFilter,
    ) -> AppResult<Vec<(Schedule, Option<PublishedPost>)>> {
        let mut conn = get_connection(&self.pool).await?;

        let mut query = schedules::table.select(Schedule::as_select()).into_boxed();
        if let Some(workspace_id) = filter.workspace_id {
            query = query.filter(schedules::workspace_id.eq(workspace_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(schedules::status.eq(status));
        }
        let rows: Vec<Schedule> = query
            .order(schedules::scheduled_at.asc())
            .limit(filter.limit)
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list schedules"))?;

        let ids: Vec<Uuid> = rows.iter().map(|s| s.id).collect();
        let records: Vec<PublishedPost> = published_posts::table
            .filter(published_posts::schedule_id.eq_any(&ids))
            .select(PublishedPost::as_select())
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list published"))?;

        Ok(rows
            .into_iter()
            .map(|schedule| {
                let record = records
                    .iter()
                    .find(|r| r.schedule_id == schedule.id)
                    .cloned();
                (schedule, record)
            })
            .collect())
    }

    /// Claim-then-verify pairing of one slot with one content-pool item.
    pub async fn claim_pair(
        &self,
        slot: &SchedulingSlot,
        post_draft_id: Uuid,
    ) -> AppResult<PairClaim> {
        let mut conn = get_connection(&self.pool).await?;
        let slot = slot.clone();

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let claimed = diesel::update(
                    scheduling_slots::table
                        .filter(scheduling_slots::id.eq(slot.id))
                        .filter(scheduling_slots::assigned_content_id.is_null()),
                )
                .set(scheduling_slots::assigned_content_id.eq(Some(post_draft_id)))
                .execute(conn)
                .await?;
                if claimed == 0 {
                    return Ok(PairClaim::SlotTaken);
                }

                let consumed: bool = diesel::select(exists(
                    schedules::table.filter(schedules::slot_id.eq(slot.id)),
                ))
                .get_result(conn)
                .await?;
                if consumed {
                    release_slot(conn, slot.id, post_draft_id).await?;
                    return Ok(PairClaim::SlotConsumed);
                }

                let now = Utc::now();
                let moved = diesel::update(
                    post_drafts::table
                        .filter(post_drafts::id.eq(post_draft_id))
                        .filter(post_drafts::status.eq(ContentStatus::Generated)),
                )
                .set((
                    post_drafts::status.eq(ContentStatus::TempScheduled),
                    post_drafts::temp_scheduled_at.eq(Some(slot.scheduled_at)),
                    post_drafts::updated_at.eq(now),
                ))
                .execute(conn)
                .await?;
                if moved == 0 {
                    release_slot(conn, slot.id, post_draft_id).await?;
                    return Ok(PairClaim::ContentTaken);
                }

                let schedule = diesel::insert_into(schedules::table)
                    .values(&NewSchedule::for_slot(
                        slot.workspace_id,
                        &slot.platform,
                        slot.scheduled_at,
                        slot.id,
                        post_draft_id,
                    ))
                    .returning(Schedule::as_returning())
                    .get_result(conn)
                    .await?;

                Ok(PairClaim::Scheduled(schedule))
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn confirm(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Schedule>> {
        let mut conn = get_connection(&self.pool).await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let confirmed = diesel::update(
                    schedules::table
                        .filter(schedules::id.eq(id))
                        .filter(schedules::status.eq(ScheduleStatus::Waiting))
                        .filter(schedules::is_confirmed.eq(false)),
                )
                .set((
                    schedules::is_confirmed.eq(true),
                    schedules::updated_at.eq(now),
                ))
                .returning(Schedule::as_returning())
                .get_result(conn)
                .await
                .optional()?;

                if let Some(post_draft_id) = confirmed.as_ref().and_then(|s| s.post_draft_id) {
                    diesel::update(
                        post_drafts::table
                            .filter(post_drafts::id.eq(post_draft_id))
                            .filter(post_drafts::status.eq(ContentStatus::TempScheduled)),
                    )
                    .set((
                        post_drafts::status.eq(ContentStatus::Confirmed),
                        post_drafts::confirmed_at.eq(Some(now)),
                        post_drafts::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;
                }

                Ok(confirmed)
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn cancel(&self, id: Uuid) -> AppResult<CancelOutcome> {
        let mut conn = get_connection(&self.pool).await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let Some(schedule) = schedules::table
                    .find(id)
                    .select(Schedule::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                else {
                    return Ok(CancelOutcome::NotFound);
                };

                let published = has_published_record(conn, id).await?;
                if let Some(reason) = cancel_rejection(&schedule, published) {
                    return Ok(CancelOutcome::Rejected(reason));
                }

                let deleted = diesel::delete(
                    schedules::table
                        .filter(schedules::id.eq(id))
                        .filter(schedules::status.eq(ScheduleStatus::Waiting)),
                )
                .execute(conn)
                .await?;
                if deleted == 0 {
                    return Ok(CancelOutcome::Rejected(
                        "schedule changed state concurrently".to_string(),
                    ));
                }

                release_links(conn, &schedule).await?;
                Ok(CancelOutcome::Cancelled)
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn cleanup_failed(&self, workspace_id: Option<Uuid>) -> AppResult<u64> {
        let mut conn = get_connection(&self.pool).await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let mut candidates = schedules::table
                    .filter(schedules::status.eq(ScheduleStatus::Failed))
                    .select(schedules::id)
                    .into_boxed();
                if let Some(workspace_id) = workspace_id {
                    candidates = candidates.filter(schedules::workspace_id.eq(workspace_id));
                }
                let ids: Vec<Uuid> = candidates.load(conn).await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                // Locking clauses cannot be boxed; lock and recheck in a
                // second, concrete query.
                let failed: Vec<Schedule> = schedules::table
                    .filter(schedules::id.eq_any(ids))
                    .filter(schedules::status.eq(ScheduleStatus::Failed))
                    .filter(not(exists(
                        published_posts::table
                            .filter(published_posts::schedule_id.eq(schedules::id)),
                    )))
                    .select(Schedule::as_select())
                    .for_update()
                    .load(conn)
                    .await?;

                let mut removed = 0;
                for schedule in &failed {
                    removed += diesel::delete(
                        schedules::table
                            .filter(schedules::id.eq(schedule.id))
                            .filter(schedules::status.eq(ScheduleStatus::Failed)),
                    )
                    .execute(conn)
                    .await? as u64;
                    release_links(conn, schedule).await?;
                }
                Ok(removed)
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn find_due(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Schedule>> {
        let mut conn = get_connection(&self.pool).await?;

        let confirmed_drafts = drafts::table
            .filter(
                drafts::confirmed_at
                    .is_not_null()
                    .or(drafts::status.eq(ContentStatus::Confirmed)),
            )
            .select(drafts::id.nullable());

        schedules::table
            .filter(schedules::status.eq(ScheduleStatus::Waiting))
            .filter(schedules::scheduled_at.le(now))
            .filter(
                schedules::is_confirmed
                    .eq(true)
                    .or(schedules::draft_id.eq_any(confirmed_drafts)),
            )
            .order(schedules::scheduled_at.asc())
            .limit(limit)
            .select(Schedule::as_select())
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find due schedules"))
    }

    /// `waiting -> posting`, or re-entry of a claim stamped with `claimed_at`.
    pub async fn claim(&self, id: Uuid, claimed_at: DateTime<Utc>) -> AppResult<Option<Schedule>> {
        let mut conn = get_connection(&self.pool).await?;

        let claimed = diesel::update(
            schedules::table
                .filter(schedules::id.eq(id))
                .filter(schedules::status.eq(ScheduleStatus::Waiting)),
        )
        .set((
            schedules::status.eq(ScheduleStatus::Posting),
            schedules::claimed_at.eq(Some(claimed_at)),
            schedules::attempt_count.eq(schedules::attempt_count + 1),
            schedules::updated_at.eq(claimed_at),
        ))
        .returning(Schedule::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "claim schedule"))?;

        if claimed.is_some() {
            return Ok(claimed);
        }

        schedules::table
            .filter(schedules::id.eq(id))
            .filter(schedules::status.eq(ScheduleStatus::Posting))
            .filter(schedules::claimed_at.eq(claimed_at))
            .select(Schedule::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "reenter claim"))
    }

    pub async fn load_publish_context(&self, schedule: &Schedule) -> AppResult<PublishContext> {
        let mut conn = get_connection(&self.pool).await?;
        let convert = |e| DatabaseErrorConverter::convert_diesel_error(e, "load publish context");

        let post_draft = match schedule.post_draft_id {
            Some(id) => post_drafts::table
                .find(id)
                .select(PostDraft::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(convert)?,
            None => None,
        };
        let draft = match schedule.draft_id {
            Some(id) => drafts::table
                .find(id)
                .select(Draft::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(convert)?,
            None => None,
        };
        let credentials = platform_credentials::table
            .filter(platform_credentials::workspace_id.eq(schedule.workspace_id))
            .filter(platform_credentials::platform.eq(&schedule.platform))
            .select(PlatformCredential::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(convert)?;

        Ok(PublishContext {
            post_draft,
            draft,
            credentials,
        })
    }

    pub async fn release(&self, id: Uuid, error_text: &str) -> AppResult<bool> {
        let mut conn = get_connection(&self.pool).await?;

        let updated = diesel::update(
            schedules::table
                .filter(schedules::id.eq(id))
                .filter(schedules::status.eq(ScheduleStatus::Posting)),
        )
        .set((
            schedules::status.eq(ScheduleStatus::Waiting),
            schedules::error_text.eq(Some(error_text)),
            schedules::claimed_at.eq(None::<DateTime<Utc>>),
            schedules::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "release schedule"))?;

        Ok(updated > 0)
    }

    pub async fn fail(&self, id: Uuid, error_text: &str) -> AppResult<bool> {
        let mut conn = get_connection(&self.pool).await?;

        let updated = diesel::update(
            schedules::table
                .filter(schedules::id.eq(id))
                .filter(schedules::status.eq(ScheduleStatus::Posting)),
        )
        .set((
            schedules::status.eq(ScheduleStatus::Failed),
            schedules::error_text.eq(Some(error_text)),
            schedules::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "fail schedule"))?;

        Ok(updated > 0)
    }

    pub async fn finalize(
        &self,
        id: Uuid,
        payload: PublishedPayload,
    ) -> AppResult<FinalizeOutcome> {
        let mut conn = get_connection(&self.pool).await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let Some(schedule) = schedules::table
                    .find(id)
                    .select(Schedule::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                else {
                    return Err(AppError::not_found("schedule", id));
                };

                if let Some(existing) = find_published(conn, id).await? {
                    return Ok(FinalizeOutcome::AlreadyPublished(existing));
                }
                if schedule.status != ScheduleStatus::Posting {
                    return Err(AppError::conflict(format!(
                        "schedule {} is {}, expected posting",
                        id, schedule.status
                    )));
                }

                let inserted: Vec<PublishedPost> = diesel::insert_into(published_posts::table)
                    .values(&NewPublishedPost {
                        id: Uuid::new_v4(),
                        schedule_id: id,
                        platform: payload.platform,
                        external_post_id: payload.external_post_id,
                        raw: payload.raw,
                    })
                    .on_conflict(published_posts::schedule_id)
                    .do_nothing()
                    .returning(PublishedPost::as_returning())
                    .get_results(conn)
                    .await?;
                let outcome = match inserted.into_iter().next() {
                    Some(record) => FinalizeOutcome::Published(record),
                    None => match find_published(conn, id).await? {
                        Some(existing) => return Ok(FinalizeOutcome::AlreadyPublished(existing)),
                        None => return Err(AppError::conflict("published record vanished")),
                    },
                };

                let now = Utc::now();
                diesel::update(schedules::table.find(id))
                    .set((
                        schedules::status.eq(ScheduleStatus::Posted),
                        schedules::error_text.eq(None::<String>),
                        schedules::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;

                // Sibling finalizes serialize on the content row; under read
                // committed the count below then sees the sibling's commit.
                match schedule.content_ref() {
                    Some(ContentRef::PostDraft(draft_id)) => {
                        post_drafts::table
                            .find(draft_id)
                            .select(post_drafts::id)
                            .for_update()
                            .first::<Uuid>(conn)
                            .await
                            .optional()?;
                        let pending: i64 = schedules::table
                            .filter(schedules::post_draft_id.eq(draft_id))
                            .filter(schedules::id.ne(id))
                            .filter(schedules::status.eq_any([
                                ScheduleStatus::Waiting,
                                ScheduleStatus::Posting,
                            ]))
                            .count()
                            .get_result(conn)
                            .await?;
                        diesel::update(post_drafts::table.find(draft_id))
                            .set((
                                post_drafts::status.eq(aggregate_status(pending)),
                                post_drafts::updated_at.eq(now),
                            ))
                            .execute(conn)
                            .await?;
                    }
                    Some(ContentRef::Draft(draft_id)) => {
                        drafts::table
                            .find(draft_id)
                            .select(drafts::id)
                            .for_update()
                            .first::<Uuid>(conn)
                            .await
                            .optional()?;
                        let pending: i64 = schedules::table
                            .filter(schedules::draft_id.eq(draft_id))
                            .filter(schedules::id.ne(id))
                            .filter(schedules::status.eq_any([
                                ScheduleStatus::Waiting,
                                ScheduleStatus::Posting,
                            ]))
                            .count()
                            .get_result(conn)
                            .await?;
                        diesel::update(drafts::table.find(draft_id))
                            .set((
                                drafts::status.eq(aggregate_status(pending)),
                                drafts::updated_at.eq(now),
                            ))
                            .execute(conn)
                            .await?;
                    }
                    None => {}
                }

                Ok(outcome)
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn reclaim_stale(&self, cutoff: DateTime<Utc>, error_text: &str) -> AppResult<u64> {
        let mut conn = get_connection(&self.pool).await?;

        let reclaimed = diesel::update(
            schedules::table
                .filter(schedules::status.eq(ScheduleStatus::Posting))
                .filter(schedules::claimed_at.lt(cutoff))
                .filter(not(exists(
                    published_posts::table.filter(published_posts::schedule_id.eq(schedules::id)),
                ))),
        )
        .set((
            schedules::status.eq(ScheduleStatus::Waiting),
            schedules::error_text.eq(Some(error_text)),
            schedules::claimed_at.eq(None::<DateTime<Utc>>),
            schedules::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "reclaim stale"))?;

        Ok(reclaimed as u64)
    }
}

fn aggregate_status(pending_siblings: i64) -> ContentStatus {
    if pending_siblings == 0 {
        ContentStatus::Posted
    } else {
        ContentStatus::Posting
    }
}

async fn find_published(
    conn: &mut AsyncPgConnection,
    schedule_id: Uuid,
) -> QueryResult<Option<PublishedPost>> {
    published_posts::table
        .filter(published_posts::schedule_id.eq(schedule_id))
        .select(PublishedPost::as_select())
        .first(conn)
        .await
        .optional()
}

async fn has_published_record(conn: &mut AsyncPgConnection, schedule_id: Uuid) -> QueryResult<bool> {
    diesel::select(exists(
        published_posts::table.filter(published_posts::schedule_id.eq(schedule_id)),
    ))
    .get_result(conn)
    .await
}

async fn release_slot(
    conn: &mut AsyncPgConnection,
    slot_id: Uuid,
    content_id: Uuid,
) -> QueryResult<usize> {
    diesel::update(
        scheduling_slots::table
            .filter(scheduling_slots::id.eq(slot_id))
            .filter(scheduling_slots::assigned_content_id.eq(content_id)),
    )
    .set(scheduling_slots::assigned_content_id.eq(None::<Uuid>))
    .execute(conn)
    .await
}

/// Returns a removed schedule's slot and content item to the pool.
async fn release_links(conn: &mut AsyncPgConnection, schedule: &Schedule) -> QueryResult<()> {
    let Some(post_draft_id) = schedule.post_draft_id else {
        return Ok(());
    };
    if let Some(slot_id) = schedule.slot_id {
        release_slot(conn, slot_id, post_draft_id).await?;
    }
    diesel::update(
        post_drafts::table
            .filter(post_drafts::id.eq(post_draft_id))
            .filter(
                post_drafts::status.eq_any([ContentStatus::TempScheduled, ContentStatus::Confirmed]),
            ),
    )
    .set((
        post_drafts::status.eq(ContentStatus::Generated),
        post_drafts::temp_scheduled_at.eq(None::<DateTime<Utc>>),
        post_drafts::confirmed_at.eq(None::<DateTime<Utc>>),
        post_drafts::updated_at.eq(Utc::now()),
    ))
    .execute(conn)
    .await?;
    Ok(())
}
