//! Behaviour every [`SchedulingStore`] backend must share, run against both
//! the memory store and (when a database is configured) Postgres.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use super::store::{FinalizeOutcome, PairClaim, PublishedPayload, ScheduleFilter, SchedulingStore};
use crate::models::{
    ContentStatus, NewPostDraft, NewSchedule, NewSchedulingSlot, NewWorkspace, PostDraft,
    Schedule, ScheduleStatus, SchedulingSlot,
};

pub(crate) async fn seed_workspace(store: &dyn SchedulingStore) -> Uuid {
    let id = Uuid::new_v4();
    store
        .create_workspace(NewWorkspace {
            id,
            name: format!("contract-{}", id),
            scheduling_policy: None,
        })
        .await
        .unwrap();
    id
}

async fn seed_post_draft(store: &dyn SchedulingStore, workspace_id: Uuid) -> PostDraft {
    store
        .create_post_draft(NewPostDraft {
            id: Uuid::new_v4(),
            workspace_id,
            platform: "threads".to_string(),
            body: "hello".to_string(),
            thread_replies: json!([]),
        })
        .await
        .unwrap()
}

async fn seed_open_slots(
    store: &dyn SchedulingStore,
    workspace_id: Uuid,
    count: i64,
) -> Vec<SchedulingSlot> {
    let base = Utc::now() + Duration::hours(1);
    let slots = (0..count)
        .map(|i| NewSchedulingSlot {
            id: Uuid::new_v4(),
            workspace_id,
            platform: "threads".to_string(),
            scheduled_at: base + Duration::hours(i),
        })
        .collect();
    store.insert_slots(slots).await.unwrap();
    store
        .list_open_slots(workspace_id, None, Utc::now(), count)
        .await
        .unwrap()
}

/// Creates a confirmed schedule for `post_draft_id` and claims it for
/// publishing.
async fn posting_schedule(
    store: &dyn SchedulingStore,
    workspace_id: Uuid,
    post_draft_id: Uuid,
) -> Schedule {
    let schedule = store
        .create_schedule(NewSchedule {
            id: Uuid::new_v4(),
            workspace_id,
            platform: "threads".to_string(),
            scheduled_at: Utc::now() - Duration::minutes(1),
            status: ScheduleStatus::Waiting,
            is_confirmed: true,
            slot_id: None,
            draft_id: None,
            post_draft_id: Some(post_draft_id),
            post_text: None,
        })
        .await
        .unwrap();
    store
        .claim_schedule(schedule.id, Utc::now())
        .await
        .unwrap()
        .expect("fresh schedule should be claimable")
}

fn payload(external_post_id: &str) -> PublishedPayload {
    PublishedPayload {
        platform: "threads".to_string(),
        external_post_id: external_post_id.to_string(),
        raw: None,
    }
}

async fn post_draft_status(
    store: &dyn SchedulingStore,
    workspace_id: Uuid,
    id: Uuid,
) -> ContentStatus {
    store
        .list_post_drafts(workspace_id, None, None, 100)
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.id == id)
        .map(|d| d.status)
        .expect("post draft should exist")
}

async fn published_records(store: &dyn SchedulingStore, workspace_id: Uuid) -> usize {
    store
        .list_schedules(ScheduleFilter {
            workspace_id: Some(workspace_id),
            status: None,
            limit: 100,
        })
        .await
        .unwrap()
        .into_iter()
        .filter(|(_, published)| published.is_some())
        .count()
}

pub(crate) async fn finalize_twice_keeps_one_record(store: &dyn SchedulingStore) {
    let ws = seed_workspace(store).await;
    let draft = seed_post_draft(store, ws).await;
    let schedule = posting_schedule(store, ws, draft.id).await;

    let first = store
        .finalize_published(schedule.id, payload("ext-1"))
        .await
        .unwrap();
    let second = store
        .finalize_published(schedule.id, payload("ext-2"))
        .await
        .unwrap();

    let FinalizeOutcome::Published(record) = first else {
        panic!("first finalize should publish, got {:?}", first);
    };
    match second {
        FinalizeOutcome::AlreadyPublished(existing) => {
            assert_eq!(existing.id, record.id);
            assert_eq!(existing.external_post_id, "ext-1");
        }
        other => panic!("second finalize should be a no-op, got {:?}", other),
    }
    assert_eq!(published_records(store, ws).await, 1);
    assert_eq!(post_draft_status(store, ws, draft.id).await, ContentStatus::Posted);
}

/// Two schedules share one content item and finalize at the same time; the
/// item must end up posted whichever commits last.
pub(crate) async fn sibling_finalizes_settle_content(store: &dyn SchedulingStore, rounds: usize) {
    for round in 0..rounds {
        let ws = seed_workspace(store).await;
        let draft = seed_post_draft(store, ws).await;
        let left = posting_schedule(store, ws, draft.id).await;
        let right = posting_schedule(store, ws, draft.id).await;

        let (a, b) = tokio::join!(
            store.finalize_published(left.id, payload(&format!("left-{}", round))),
            store.finalize_published(right.id, payload(&format!("right-{}", round))),
        );
        assert!(matches!(a.unwrap(), FinalizeOutcome::Published(_)));
        assert!(matches!(b.unwrap(), FinalizeOutcome::Published(_)));

        assert_eq!(
            post_draft_status(store, ws, draft.id).await,
            ContentStatus::Posted,
            "round {}",
            round
        );
        assert_eq!(published_records(store, ws).await, 2);
    }
}

pub(crate) async fn racing_claims_have_one_winner(store: &dyn SchedulingStore) {
    let ws = seed_workspace(store).await;
    let draft = seed_post_draft(store, ws).await;
    let schedule = store
        .create_schedule(NewSchedule {
            id: Uuid::new_v4(),
            workspace_id: ws,
            platform: "threads".to_string(),
            scheduled_at: Utc::now() - Duration::minutes(1),
            status: ScheduleStatus::Waiting,
            is_confirmed: true,
            slot_id: None,
            draft_id: None,
            post_draft_id: Some(draft.id),
            post_text: None,
        })
        .await
        .unwrap();

    let attempts = (0..4).map(|i| store.claim_schedule(schedule.id, Utc::now() + Duration::seconds(i)));
    let winners = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .filter(Option::is_some)
        .count();

    assert_eq!(winners, 1);
    let stored = store.find_schedule(schedule.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ScheduleStatus::Posting);
}

/// One slot raced by two items, then one item raced across two slots.
pub(crate) async fn concurrent_pairing_books_once(store: &dyn SchedulingStore) {
    let ws = seed_workspace(store).await;
    let open = seed_open_slots(store, ws, 3).await;
    assert_eq!(open.len(), 3);
    let first = seed_post_draft(store, ws).await;
    let second = seed_post_draft(store, ws).await;
    let shared = seed_post_draft(store, ws).await;

    let (a, b) = tokio::join!(
        store.claim_pair(&open[0], first.id),
        store.claim_pair(&open[0], second.id),
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    let booked = outcomes
        .iter()
        .filter(|o| matches!(o, PairClaim::Scheduled(_)))
        .count();
    assert_eq!(booked, 1);
    assert!(outcomes.contains(&PairClaim::SlotTaken));

    let (c, d) = tokio::join!(
        store.claim_pair(&open[1], shared.id),
        store.claim_pair(&open[2], shared.id),
    );
    let outcomes = [c.unwrap(), d.unwrap()];
    let booked = outcomes
        .iter()
        .filter(|o| matches!(o, PairClaim::Scheduled(_)))
        .count();
    assert_eq!(booked, 1);
    assert!(outcomes.contains(&PairClaim::ContentTaken));

    let schedules = store
        .list_schedules(ScheduleFilter {
            workspace_id: Some(ws),
            status: None,
            limit: 100,
        })
        .await
        .unwrap();
    assert_eq!(schedules.len(), 2);

    // The slot that lost the shared item is open again.
    let still_open = store
        .list_open_slots(ws, None, Utc::now(), 10)
        .await
        .unwrap();
    assert_eq!(still_open.len(), 1);
}

pub(crate) async fn cleanup_removes_failed_and_releases(store: &dyn SchedulingStore) {
    let ws = seed_workspace(store).await;
    let open = seed_open_slots(store, ws, 1).await;
    let draft = seed_post_draft(store, ws).await;

    let PairClaim::Scheduled(schedule) = store.claim_pair(&open[0], draft.id).await.unwrap() else {
        panic!("pairing an open slot should schedule");
    };
    store.claim_schedule(schedule.id, Utc::now()).await.unwrap();
    assert!(store.fail_schedule(schedule.id, "connector rejected").await.unwrap());

    assert_eq!(store.cleanup_failed(Some(ws)).await.unwrap(), 1);
    assert_eq!(store.cleanup_failed(Some(ws)).await.unwrap(), 0);

    assert!(store.find_schedule(schedule.id).await.unwrap().is_none());
    let reopened = store
        .list_open_slots(ws, None, Utc::now(), 10)
        .await
        .unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened[0].id, open[0].id);
    assert_eq!(post_draft_status(store, ws, draft.id).await, ContentStatus::Generated);
}
