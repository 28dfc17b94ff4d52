//! Cron tick DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::services::publishing::{TickReport, TickResult};

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
pub struct TickQuery {
    /// Maximum schedules to process, clamped to 1..=50 (default 20)
    pub limit: Option<i64>,
    /// Shared secret, when not sent as a header
    pub secret: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TickResponse {
    pub ok: bool,
    pub now: DateTime<Utc>,
    pub found: usize,
    pub processed: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub reclaimed: u64,
    pub results: Vec<TickResult>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl From<TickReport> for TickResponse {
    fn from(report: TickReport) -> Self {
        Self {
            ok: true,
            now: report.now,
            found: report.found,
            processed: report.processed,
            failed: report.failed,
            reclaimed: report.reclaimed,
            results: report.results,
        }
    }
}
