//! Time-window expansion.
//!
//! Turns a declarative [`SchedulingPolicy`] into concrete UTC timestamps, one
//! batch per (local day, platform). Pure and deterministic: the jitter is a
//! hash of `workspace|platform|date|index`, never a random source.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{SchedulingPolicy, TimeWindow};

/// One generated candidate slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedSlot {
    pub platform: String,
    /// Local calendar day whose batch produced this slot.
    pub local_date: NaiveDate,
    pub scheduled_at: DateTime<Utc>,
}

/// Expands `policy` into candidate slots sorted by time (then platform).
///
/// Days with no matching usable window and platforms with a zero limit
/// produce nothing; that is not an error.
pub fn expand(policy: &SchedulingPolicy, workspace_id: Uuid) -> AppResult<Vec<ExpandedSlot>> {
    let offset = policy.offset()?;
    let mut slots = Vec::new();

    for date in policy
        .start_date
        .iter_days()
        .take_while(|date| *date <= policy.end_date)
    {
        let day_of_week = date.weekday().num_days_from_sunday() as u8;
        let windows: Vec<&TimeWindow> = policy
            .core_time_windows
            .iter()
            .filter(|window| window.applies_to(day_of_week) && window.span_minutes() > 0)
            .collect();
        if windows.is_empty() {
            continue;
        }

        for (platform, &limit) in &policy.daily_post_limit {
            if limit == 0 {
                continue;
            }

            let minutes = day_series(
                &windows,
                limit,
                policy.min_interval_minutes,
                policy.random_jitter_minutes,
                |index| jitter_seed(workspace_id, platform, date, index),
            );

            for minute in minutes {
                slots.push(ExpandedSlot {
                    platform: platform.clone(),
                    local_date: date,
                    scheduled_at: local_to_utc(date, minute, offset)?,
                });
            }
        }
    }

    slots.sort_by(|a, b| {
        a.scheduled_at
            .cmp(&b.scheduled_at)
            .then_with(|| a.platform.cmp(&b.platform))
    });
    // A batch pushed past midnight can land on the next day's batch.
    slots.dedup_by(|b, a| a.scheduled_at == b.scheduled_at && a.platform == b.platform);
    Ok(slots)
}

/// Minutes after local midnight for one (day, platform) batch, ascending.
fn day_series(
    windows: &[&TimeWindow],
    limit: u32,
    min_interval: u32,
    jitter: u32,
    seed: impl Fn(u32) -> String,
) -> Vec<i64> {
    let mut minutes: Vec<i64> = (0..limit)
        .map(|index| {
            let window = windows[index as usize % windows.len()];
            let start = window.start_time.minutes();
            let end = window.end_time.minutes();
            let span = window.span_minutes();

            // floor(((i + 0.5) / limit) * span) in integer arithmetic
            let base = ((2 * i64::from(index) + 1) * span).div_euclid(2 * i64::from(limit));
            let shift = if jitter > 0 {
                let unit = unit_interval(&seed(index));
                ((2.0 * unit - 1.0) * f64::from(jitter)).round() as i64
            } else {
                0
            };

            (start + base + shift).clamp(start, end)
        })
        .collect();

    minutes.sort_unstable();

    if min_interval == 0 {
        minutes.dedup();
    } else {
        let gap = i64::from(min_interval);
        for i in 1..minutes.len() {
            let floor = minutes[i - 1] + gap;
            if minutes[i] < floor {
                minutes[i] = floor;
            }
        }
    }

    minutes
}

fn jitter_seed(workspace_id: Uuid, platform: &str, date: NaiveDate, index: u32) -> String {
    format!(
        "{}|{}|{}|{}",
        workspace_id,
        platform,
        date.format("%Y-%m-%d"),
        index
    )
}

/// FNV-1a (32 bit) of `seed`, scaled to [0, 1).
fn unit_interval(seed: &str) -> f64 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in seed.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    f64::from(hash) / 4_294_967_296.0
}

fn local_to_utc(date: NaiveDate, minute: i64, offset: FixedOffset) -> AppResult<DateTime<Utc>> {
    let local = date.and_hms_opt(0, 0, 0).and_then(|midnight| {
        midnight.checked_add_signed(Duration::minutes(minute))
    });
    local
        .and_then(|local| offset.from_local_datetime(&local).single())
        .map(|instant| instant.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::validation(
                "startDate",
                format!("{} +{}min is not representable", date, minute),
            )
        })
}
