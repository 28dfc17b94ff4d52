//! Content items: the content pool (`post_drafts`) and the legacy
//! single-draft flow (`drafts`).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Content item status.
///
/// `GENERATED -> TEMP_SCHEDULED -> CONFIRMED -> POSTING -> POSTED`, with a
/// reset to `GENERATED` when the schedule is cancelled or cleaned up.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum, utoipa::ToSchema,
)]
#[db_enum(existing_type_path = "crate::schema::sql_types::ContentStatus")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    Generated,
    TempScheduled,
    Confirmed,
    Posting,
    Posted,
}

/// Content-pool item awaiting (or holding) a slot
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::post_drafts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostDraft {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub body: String,
    pub thread_replies: JsonValue,
    pub status: ContentStatus,
    pub temp_scheduled_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostDraft {
    /// Thread replies in order. Non-string or blank entries are dropped and a
    /// malformed column reads as no replies.
    pub fn replies(&self) -> Vec<String> {
        match &self.thread_replies {
            JsonValue::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::post_drafts)]
pub struct NewPostDraft {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub platform: String,
    pub body: String,
    pub thread_replies: JsonValue,
}

/// Legacy single draft, confirmed by setting `confirmed_at`
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::drafts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Draft {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub body: Option<String>,
    pub formatted: Option<JsonValue>,
    pub status: ContentStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some() || self.status == ContentStatus::Confirmed
    }

    pub fn variants(&self) -> FormattedVariants {
        FormattedVariants::from_stored(self.formatted.as_ref())
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::drafts)]
pub struct NewDraft {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub body: Option<String>,
    pub formatted: Option<JsonValue>,
    pub status: ContentStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// One formatted rendition of a legacy draft
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FormattedVariant {
    #[serde(default)]
    pub text: Option<String>,
}

/// Structured formatted-variant text of a legacy draft.
///
/// Parsing is lenient: a bare JSON string is taken as the text, anything
/// unreadable becomes the empty value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FormattedVariants {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub selected: Option<usize>,
    #[serde(default)]
    pub variants: Vec<FormattedVariant>,
}

impl FormattedVariants {
    pub fn from_stored(value: Option<&JsonValue>) -> Self {
        match value {
            Some(JsonValue::String(text)) => Self {
                text: Some(text.clone()),
                ..Self::default()
            },
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
            None => Self::default(),
        }
    }

    /// Explicit text first, then the selected variant, then the first
    /// non-blank variant.
    pub fn best_text(&self) -> Option<&str> {
        non_blank(&self.text)
            .or_else(|| {
                self.selected
                    .and_then(|index| self.variants.get(index))
                    .and_then(|variant| non_blank(&variant.text))
            })
            .or_else(|| self.variants.iter().find_map(|variant| non_blank(&variant.text)))
    }
}

fn non_blank(text: &Option<String>) -> Option<&str> {
    text.as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}
