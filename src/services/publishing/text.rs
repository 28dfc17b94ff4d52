//! Picks what to post for a due schedule.

use crate::models::Schedule;
use crate::repositories::PublishContext;

/// Text to publish: a single item, or a root followed by replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostBody {
    Single(String),
    Thread { root: String, replies: Vec<String> },
}

pub const EMPTY_TEXT: &str = "post text is empty";

/// Resolution order: explicit schedule text, the pool item's body (with its
/// thread replies), the legacy draft's body, then the draft's best formatted
/// variant. Everything is trimmed; nothing left means [`EMPTY_TEXT`].
pub fn resolve(schedule: &Schedule, context: &PublishContext) -> Result<PostBody, &'static str> {
    if let Some(text) = non_blank(schedule.post_text.as_deref()) {
        return Ok(PostBody::Single(text));
    }

    if let Some(post_draft) = &context.post_draft {
        if let Some(root) = non_blank(Some(&post_draft.body)) {
            let replies = post_draft.replies();
            return Ok(if replies.is_empty() {
                PostBody::Single(root)
            } else {
                PostBody::Thread { root, replies }
            });
        }
    }

    if let Some(draft) = &context.draft {
        let text = non_blank(draft.body.as_deref())
            .or_else(|| draft.variants().best_text().map(String::from));
        if let Some(text) = text {
            return Ok(PostBody::Single(text));
        }
    }

    Err(EMPTY_TEXT)
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}
