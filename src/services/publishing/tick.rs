use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use super::text::{PostBody, resolve};
use super::{PublishingService, STALE_RECLAIM_TEXT, tick_limit};
use crate::error::{AppError, AppResult};
use crate::external::publish::PublishOutcome;
use crate::models::Schedule;
use crate::repositories::{PublishContext, PublishedPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TickOutcome {
    /// Published and finalized.
    Posted,
    /// Permanently failed; needs operator action.
    Failed,
    /// Reverted to waiting for a later tick.
    Requeued,
    /// Claimed by someone else first.
    Skipped,
    /// Processing broke down before a publish outcome could be recorded.
    Error,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TickResult {
    pub schedule_id: Uuid,
    pub outcome: TickOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TickReport {
    pub now: DateTime<Utc>,
    pub found: usize,
    /// Schedules this tick claimed and carried to an outcome.
    pub processed: usize,
    /// Schedules that did not end up posted, excluding skipped ones.
    pub failed: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub reclaimed: u64,
    pub results: Vec<TickResult>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// What one schedule has achieved so far. Survives attempt retries so a
/// claim is re-entered rather than repeated and a publish is never repeated.
#[derive(Default)]
struct Progress {
    claimed: Option<Schedule>,
    outcome: Option<PublishOutcome>,
}

enum Step {
    Skipped,
    Posted(String),
    Requeued(String),
    Failed(String),
}

impl PublishingService {
    /// Processes due schedules, oldest first.
    ///
    /// Per-schedule failures become result entries; only failing to load the
    /// due list is an error for the whole tick.
    pub async fn tick(&self, limit: Option<i64>) -> AppResult<TickReport> {
        let limit = tick_limit(limit);
        let span = tracing::info_span!("tick", limit = limit);
        self.run_tick(limit).instrument(span).await
    }

    async fn run_tick(&self, limit: i64) -> AppResult<TickReport> {
        let now = Utc::now();
        let reclaimed = self.reclaim_stale(now).await;

        let due = self.store.find_due_schedules(now, limit).await?;
        let found = due.len();
        tracing::info!(found = found, "Loaded due schedules");

        let mut results = Vec::with_capacity(found);
        for schedule in due {
            results.push(self.process(schedule).await);
        }

        let processed = results
            .iter()
            .filter(|r| r.outcome != TickOutcome::Skipped)
            .count();
        let failed = results
            .iter()
            .filter(|r| !matches!(r.outcome, TickOutcome::Posted | TickOutcome::Skipped))
            .count();

        tracing::info!(
            found = found,
            processed = processed,
            failed = failed,
            "Tick finished"
        );

        Ok(TickReport {
            now,
            found,
            processed,
            failed,
            reclaimed,
            results,
        })
    }

    async fn reclaim_stale(&self, now: DateTime<Utc>) -> u64 {
        if self.config.stale_posting_minutes <= 0 {
            return 0;
        }
        let cutoff = now - chrono::Duration::minutes(self.config.stale_posting_minutes);
        match self.store.reclaim_stale(cutoff, STALE_RECLAIM_TEXT).await {
            Ok(0) => 0,
            Ok(count) => {
                tracing::warn!(reclaimed = count, "Reverted stale posting claims");
                count
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stale claim sweep failed");
                0
            }
        }
    }

    async fn process(&self, schedule: Schedule) -> TickResult {
        let claimed_at = Utc::now().trunc_subsecs(6);
        let max_attempts = self.config.max_attempts.max(1);
        let mut progress = Progress::default();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.attempt(&schedule, claimed_at, &mut progress).await {
                Ok(step) => return self.report(&schedule, step, attempt),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        schedule_id = %schedule.id,
                        attempt = attempt,
                        error = %e,
                        "Transient storage failure, retrying schedule"
                    );
                    let backoff = self.config.backoff_ms.saturating_mul(u64::from(attempt));
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return self.abandon(&schedule, &progress, e, attempt).await,
            }
        }
    }

    async fn attempt(
        &self,
        schedule: &Schedule,
        claimed_at: DateTime<Utc>,
        progress: &mut Progress,
    ) -> AppResult<Step> {
        let claimed = match &progress.claimed {
            Some(claimed) => claimed.clone(),
            None => match self.store.claim_schedule(schedule.id, claimed_at).await? {
                Some(claimed) => {
                    progress.claimed = Some(claimed.clone());
                    claimed
                }
                None => return Ok(Step::Skipped),
            },
        };

        let outcome = match &progress.outcome {
            Some(outcome) => outcome.clone(),
            None => {
                let context = self.store.load_publish_context(&claimed).await?;
                let outcome = self.publish(&claimed, &context).await;
                progress.outcome = Some(outcome.clone());
                outcome
            }
        };

        match outcome {
            PublishOutcome::Success { external_id, raw } => {
                let finalized = self
                    .store
                    .finalize_published(
                        claimed.id,
                        PublishedPayload {
                            platform: claimed.platform.clone(),
                            external_post_id: external_id,
                            raw,
                        },
                    )
                    .await?;
                Ok(Step::Posted(finalized.record().external_post_id.clone()))
            }
            PublishOutcome::Failure {
                message,
                retryable: true,
                ..
            } => {
                if !self.store.release_schedule(claimed.id, &message).await? {
                    tracing::warn!(schedule_id = %claimed.id, "Schedule left posting before release");
                }
                Ok(Step::Requeued(message))
            }
            PublishOutcome::Failure { message, .. } => {
                if !self.store.fail_schedule(claimed.id, &message).await? {
                    tracing::warn!(schedule_id = %claimed.id, "Schedule left posting before fail");
                }
                Ok(Step::Failed(message))
            }
        }
    }

    /// Resolves text and credentials, then calls the platform's connector.
    /// Every problem becomes a failure outcome.
    async fn publish(&self, schedule: &Schedule, context: &PublishContext) -> PublishOutcome {
        let body = match resolve(schedule, context) {
            Ok(body) => body,
            Err(message) => return PublishOutcome::permanent(message),
        };

        let Some(credentials) = context.credentials.as_ref().and_then(|c| c.usable()) else {
            return PublishOutcome::permanent(format!(
                "missing publish credentials for platform '{}': store an access token and account id for this workspace",
                schedule.platform
            ));
        };

        let Some(connector) = self.connectors.get(&schedule.platform) else {
            return PublishOutcome::permanent(format!(
                "no publisher configured for platform '{}'",
                schedule.platform
            ));
        };

        tracing::debug!(
            schedule_id = %schedule.id,
            connector = connector.name(),
            "Publishing schedule"
        );

        match body {
            PostBody::Single(text) => connector.publish(&text, &credentials).await,
            PostBody::Thread { root, replies } => {
                connector.publish_thread(&root, &replies, &credentials).await
            }
        }
    }

    fn report(&self, schedule: &Schedule, step: Step, attempts: u32) -> TickResult {
        let mut result = TickResult {
            schedule_id: schedule.id,
            outcome: TickOutcome::Skipped,
            external_id: None,
            error: None,
            attempts,
        };
        match step {
            Step::Skipped => {}
            Step::Posted(external_id) => {
                result.outcome = TickOutcome::Posted;
                result.external_id = Some(external_id);
            }
            Step::Requeued(message) => {
                result.outcome = TickOutcome::Requeued;
                result.error = Some(message);
            }
            Step::Failed(message) => {
                result.outcome = TickOutcome::Failed;
                result.error = Some(message);
            }
        }

        tracing::info!(
            schedule_id = %schedule.id,
            platform = %schedule.platform,
            attempt = attempts,
            outcome = ?result.outcome,
            "Schedule processed"
        );
        result
    }

    /// Best-effort cleanup after the attempt budget is spent or a
    /// non-transient error surfaced.
    ///
    /// Transient errors put the schedule back to waiting, anything else marks
    /// it failed. Once the provider accepted the post the schedule is left in
    /// posting so it can never be published twice.
    async fn abandon(
        &self,
        schedule: &Schedule,
        progress: &Progress,
        error: AppError,
        attempts: u32,
    ) -> TickResult {
        let mut message = error.to_string();
        let published_id = match &progress.outcome {
            Some(PublishOutcome::Success { external_id, .. }) => Some(external_id.clone()),
            _ => None,
        };

        if let Some(external_id) = &published_id {
            message = format!(
                "published as {} but could not be finalized: {}",
                external_id, message
            );
        } else if progress.claimed.is_some() {
            let cleanup = if error.is_transient() {
                self.store.release_schedule(schedule.id, &message).await
            } else {
                self.store.fail_schedule(schedule.id, &message).await
            };
            if let Err(e) = cleanup {
                tracing::warn!(
                    schedule_id = %schedule.id,
                    error = %e,
                    "Could not reset schedule after failure"
                );
            }
        }

        tracing::error!(
            schedule_id = %schedule.id,
            platform = %schedule.platform,
            attempt = attempts,
            outcome = "error",
            error = %error,
            "Schedule processing failed"
        );

        TickResult {
            schedule_id: schedule.id,
            outcome: TickOutcome::Error,
            external_id: published_id,
            error: Some(message),
            attempts,
        }
    }
}
