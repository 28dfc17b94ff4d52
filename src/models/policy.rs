//! Workspace scheduling policy.
//!
//! The stored JSON shape is
//! `{timezone, startDate, endDate, dailyPostLimit, coreTimeWindows,
//! minIntervalMinutes, randomJitterMinutes}`. Writes go through
//! [`SchedulingPolicy::validate`]; reads of stored rows are lenient
//! ([`SchedulingPolicy::from_stored`]).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Local time of day with minute precision, written `HH:MM`.
///
/// `24:00` is accepted so a window can run until midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        let total = hour.checked_mul(60)?.checked_add(minute)?;
        (minute < 60 && total <= MINUTES_PER_DAY).then_some(Self(total))
    }

    /// Minutes since local midnight.
    pub fn minutes(self) -> i64 {
        i64::from(self.0)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid time '{}', expected HH:MM", s);
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Recurring weekly window in workspace-local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    #[schema(value_type = String, example = "08:00")]
    pub start_time: TimeOfDay,
    #[schema(value_type = String, example = "10:00")]
    pub end_time: TimeOfDay,
}

impl TimeWindow {
    pub fn applies_to(&self, day_of_week: u8) -> bool {
        self.days_of_week.contains(&day_of_week)
    }

    /// Window length in minutes; zero or negative for unusable windows.
    pub fn span_minutes(&self) -> i64 {
        self.end_time.minutes() - self.start_time.minutes()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingPolicy {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[schema(value_type = String, format = Date, example = "2025-01-06")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-01-12")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub daily_post_limit: BTreeMap<String, u32>,
    #[serde(default)]
    pub core_time_windows: Vec<TimeWindow>,
    #[serde(default)]
    pub min_interval_minutes: u32,
    #[serde(default)]
    pub random_jitter_minutes: u32,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl SchedulingPolicy {
    /// Lenient read of a stored policy column: anything that does not parse is
    /// treated as "no policy configured".
    pub fn from_stored(value: Option<&JsonValue>) -> Option<Self> {
        value
            .filter(|value| value.is_object())
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn to_stored(&self) -> AppResult<JsonValue> {
        serde_json::to_value(self).map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })
    }

    /// UTC offset of the policy timezone.
    pub fn offset(&self) -> AppResult<FixedOffset> {
        parse_timezone(&self.timezone)
    }

    /// Number of local calendar days covered, inclusive.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Strict validation applied before a policy is stored or expanded.
    pub fn validate(&self, max_range_days: u32) -> AppResult<()> {
        self.offset()?;

        if self.start_date > self.end_date {
            return Err(AppError::validation(
                "endDate",
                "endDate must not be before startDate",
            ));
        }
        if self.day_count() > i64::from(max_range_days) {
            return Err(AppError::validation(
                "endDate",
                format!("date range must not exceed {} days", max_range_days),
            ));
        }

        for platform in self.daily_post_limit.keys() {
            if platform.trim().is_empty() {
                return Err(AppError::validation(
                    "dailyPostLimit",
                    "platform names must not be empty",
                ));
            }
        }

        for (index, window) in self.core_time_windows.iter().enumerate() {
            if let Some(day) = window.days_of_week.iter().find(|day| **day > 6) {
                return Err(AppError::validation(
                    format!("coreTimeWindows[{}].daysOfWeek", index),
                    format!("day {} is out of range 0..6", day),
                ));
            }
            if window.end_time <= window.start_time {
                return Err(AppError::validation(
                    format!("coreTimeWindows[{}].endTime", index),
                    "endTime must be after startTime",
                ));
            }
        }

        Ok(())
    }
}

/// Resolves a supported timezone name to a fixed UTC offset.
///
/// Supported: `UTC`, `Etc/UTC`, `Asia/Tokyo` and explicit `+HH:MM`/`-HH:MM`.
pub fn parse_timezone(name: &str) -> AppResult<FixedOffset> {
    let unsupported = || AppError::validation("timezone", format!("unsupported timezone '{}'", name));

    let seconds = match name.trim() {
        "UTC" | "Etc/UTC" => 0,
        "Asia/Tokyo" => 9 * 3600,
        other => {
            let (sign, rest) = match other.as_bytes().first() {
                Some(b'+') => (1, &other[1..]),
                Some(b'-') => (-1, &other[1..]),
                _ => return Err(unsupported()),
            };
            let time: TimeOfDay = rest.parse().map_err(|_| unsupported())?;
            if time.minutes() > 14 * 60 {
                return Err(unsupported());
            }
            sign * (time.minutes() as i32) * 60
        }
    };

    FixedOffset::east_opt(seconds).ok_or_else(unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> SchedulingPolicy {
        serde_json::from_value(json!({
            "timezone": "Asia/Tokyo",
            "startDate": "2025-01-06",
            "endDate": "2025-01-12",
            "dailyPostLimit": {"threads": 2},
            "coreTimeWindows": [{"daysOfWeek": [1, 2], "startTime": "08:00", "endTime": "10:00"}],
            "minIntervalMinutes": 30,
            "randomJitterMinutes": 5
        }))
        .unwrap()
    }

    #[test]
    fn test_time_of_day_parse() {
        assert_eq!("08:30".parse::<TimeOfDay>().unwrap().minutes(), 510);
        assert_eq!("8:05".parse::<TimeOfDay>().unwrap().minutes(), 485);
        assert_eq!("24:00".parse::<TimeOfDay>().unwrap().minutes(), 1440);
        assert!("24:01".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("1230".parse::<TimeOfDay>().is_err());
        assert!("12:3".parse::<TimeOfDay>().is_err());
        assert_eq!("07:05".parse::<TimeOfDay>().unwrap().to_string(), "07:05");
    }

    #[test]
    fn test_policy_round_trips_camel_case() {
        let value = policy().to_stored().unwrap();
        assert_eq!(value["coreTimeWindows"][0]["startTime"], "08:00");
        assert_eq!(value["dailyPostLimit"]["threads"], 2);
        assert_eq!(SchedulingPolicy::from_stored(Some(&value)), Some(policy()));
    }

    #[test]
    fn test_from_stored_is_lenient() {
        assert_eq!(SchedulingPolicy::from_stored(None), None);
        assert_eq!(SchedulingPolicy::from_stored(Some(&json!("nope"))), None);
        assert_eq!(
            SchedulingPolicy::from_stored(Some(&json!({"startDate": "garbage"}))),
            None
        );

        let partial = json!({"startDate": "2025-01-06", "endDate": "2025-01-06"});
        let parsed = SchedulingPolicy::from_stored(Some(&partial)).unwrap();
        assert_eq!(parsed.timezone, "UTC");
        assert!(parsed.core_time_windows.is_empty());
        assert!(parsed.daily_post_limit.is_empty());
    }

    #[test]
    fn test_validate_accepts_valid_policy() {
        assert!(policy().validate(366).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut inverted = policy();
        inverted.start_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert!(inverted.validate(366).is_err());

        let mut too_long = policy();
        too_long.end_date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(too_long.validate(366).is_err());

        let mut bad_window = policy();
        bad_window.core_time_windows[0].end_time = "08:00".parse().unwrap();
        assert!(bad_window.validate(366).is_err());

        let mut bad_day = policy();
        bad_day.core_time_windows[0].days_of_week = vec![7];
        assert!(bad_day.validate(366).is_err());

        let mut bad_zone = policy();
        bad_zone.timezone = "America/New_York".to_string();
        assert!(matches!(
            bad_zone.validate(366),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_timezone("Etc/UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_timezone("Asia/Tokyo").unwrap().local_minus_utc(), 32_400);
        assert_eq!(parse_timezone("+05:30").unwrap().local_minus_utc(), 19_800);
        assert_eq!(parse_timezone("-03:00").unwrap().local_minus_utc(), -10_800);
        assert!(parse_timezone("+15:00").is_err());
        assert!(parse_timezone("Europe/Paris").is_err());
        assert!(parse_timezone("").is_err());
    }

    #[test]
    fn test_negative_limit_is_rejected_at_parse() {
        let raw = json!({
            "startDate": "2025-01-06",
            "endDate": "2025-01-06",
            "dailyPostLimit": {"threads": -1}
        });
        assert!(serde_json::from_value::<SchedulingPolicy>(raw).is_err());
    }
}
