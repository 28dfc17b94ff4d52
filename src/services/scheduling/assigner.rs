use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::SchedulingService;
use crate::error::AppResult;
use crate::models::{ContentStatus, PostDraft, SchedulingSlot};
use crate::repositories::PairClaim;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignOutcome {
    Scheduled,
    SlotTaken,
    SlotConsumed,
    ContentTaken,
    Error,
}

/// Why an assignment run produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignReason {
    NoSlotsGenerated,
    NoSlotsAvailable,
    NoPostdrafts,
    NoMatchingPlatform,
}

impl AssignReason {
    pub fn hint(self) -> &'static str {
        match self {
            AssignReason::NoSlotsGenerated => {
                "No slots exist for this workspace. Configure a scheduling policy and generate slots first."
            }
            AssignReason::NoSlotsAvailable => {
                "Every future slot is already assigned. Generate slots for a later date range."
            }
            AssignReason::NoPostdrafts => {
                "The content pool has no GENERATED post drafts. Add content before assigning."
            }
            AssignReason::NoMatchingPlatform => {
                "Open slots and pooled content exist but share no platform."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignResult {
    pub slot_id: Uuid,
    pub post_draft_id: Uuid,
    pub platform: String,
    pub scheduled_at: DateTime<Utc>,
    pub outcome: AssignOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct AssignDiagnostics {
    pub total_slots: i64,
    pub open_slots: usize,
    pub available_post_drafts: usize,
    pub pairs_attempted: usize,
    pub conflicts: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignReport {
    pub assigned: usize,
    pub results: Vec<AssignResult>,
    pub diagnostics: AssignDiagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AssignReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl SchedulingService {
    /// Pairs open future slots with GENERATED content of the same platform,
    /// oldest first on both sides.
    ///
    /// A lost race on one pair is recorded and skipped; it never aborts the
    /// run or leaves a half-applied pair behind.
    pub async fn assign(
        &self,
        workspace_id: Uuid,
        platform: Option<&str>,
        limit: Option<i64>,
    ) -> AppResult<AssignReport> {
        self.workspace(workspace_id).await?;
        let limit = self.config.assign_limit(limit);
        let platform = platform.map(str::trim).filter(|p| !p.is_empty());

        let slots = self
            .store
            .list_open_slots(workspace_id, platform, Utc::now(), limit)
            .await?;
        let drafts = if slots.is_empty() {
            Vec::new()
        } else {
            self.store
                .list_post_drafts(
                    workspace_id,
                    Some(ContentStatus::Generated),
                    platform,
                    slots.len() as i64,
                )
                .await?
        };

        let mut diagnostics = AssignDiagnostics {
            open_slots: slots.len(),
            available_post_drafts: drafts.len(),
            ..Default::default()
        };

        let pairs = pair_by_platform(slots, drafts);
        diagnostics.pairs_attempted = pairs.len();

        let mut results = Vec::with_capacity(pairs.len());
        for (slot, draft) in pairs {
            let result = self.claim(slot, draft).await;
            if matches!(
                result.outcome,
                AssignOutcome::SlotTaken | AssignOutcome::SlotConsumed | AssignOutcome::ContentTaken
            ) {
                diagnostics.conflicts += 1;
            }
            results.push(result);
        }

        let assigned = results
            .iter()
            .filter(|r| r.outcome == AssignOutcome::Scheduled)
            .count();

        let reason = if assigned == 0 {
            diagnostics.total_slots = self.store.count_slots(workspace_id, platform).await?;
            Some(explain(&diagnostics))
        } else {
            None
        };

        tracing::info!(
            workspace_id = %workspace_id,
            assigned = assigned,
            pairs = diagnostics.pairs_attempted,
            conflicts = diagnostics.conflicts,
            reason = ?reason,
            "Assignment run finished"
        );

        Ok(AssignReport {
            assigned,
            results,
            diagnostics,
            reason,
            hint: reason.map(|r| r.hint().to_string()),
        })
    }

    async fn claim(&self, slot: SchedulingSlot, draft: PostDraft) -> AssignResult {
        let mut result = AssignResult {
            slot_id: slot.id,
            post_draft_id: draft.id,
            platform: slot.platform.clone(),
            scheduled_at: slot.scheduled_at,
            outcome: AssignOutcome::Error,
            schedule_id: None,
            error: None,
        };

        match self.store.claim_pair(&slot, draft.id).await {
            Ok(PairClaim::Scheduled(schedule)) => {
                result.outcome = AssignOutcome::Scheduled;
                result.schedule_id = Some(schedule.id);
            }
            Ok(PairClaim::SlotTaken) => result.outcome = AssignOutcome::SlotTaken,
            Ok(PairClaim::SlotConsumed) => result.outcome = AssignOutcome::SlotConsumed,
            Ok(PairClaim::ContentTaken) => result.outcome = AssignOutcome::ContentTaken,
            Err(e) => {
                tracing::warn!(
                    slot_id = %slot.id,
                    post_draft_id = %draft.id,
                    error = %e,
                    "Failed to claim slot for content"
                );
                result.error = Some(e.to_string());
            }
        }
        result
    }
}

/// Groups both sides by platform and zips each group index by index.
fn pair_by_platform(
    slots: Vec<SchedulingSlot>,
    drafts: Vec<PostDraft>,
) -> Vec<(SchedulingSlot, PostDraft)> {
    let mut by_platform: BTreeMap<String, (Vec<SchedulingSlot>, Vec<PostDraft>)> =
        BTreeMap::new();
    for slot in slots {
        by_platform
            .entry(slot.platform.clone())
            .or_default()
            .0
            .push(slot);
    }
    for draft in drafts {
        by_platform
            .entry(draft.platform.clone())
            .or_default()
            .1
            .push(draft);
    }

    let mut pairs: Vec<(SchedulingSlot, PostDraft)> = by_platform
        .into_values()
        .flat_map(|(slots, drafts)| slots.into_iter().zip(drafts))
        .collect();
    pairs.sort_by_key(|(slot, _)| slot.scheduled_at);
    pairs
}

fn explain(diagnostics: &AssignDiagnostics) -> AssignReason {
    if diagnostics.total_slots == 0 {
        AssignReason::NoSlotsGenerated
    } else if diagnostics.open_slots == 0 {
        AssignReason::NoSlotsAvailable
    } else if diagnostics.available_post_drafts == 0 {
        AssignReason::NoPostdrafts
    } else if diagnostics.pairs_attempted == 0 {
        AssignReason::NoMatchingPlatform
    } else {
        AssignReason::NoSlotsAvailable
    }
}
