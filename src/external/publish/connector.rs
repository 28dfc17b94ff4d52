//! Core publish connector trait and outcome types.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value as JsonValue, json};

use crate::models::PublishCredentials;

/// Tri-state result of a publish call.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Success {
        external_id: String,
        raw: Option<JsonValue>,
    },
    Failure {
        message: String,
        /// True for 5xx/429/transport failures; false for validation and
        /// auth rejections.
        retryable: bool,
        raw: Option<JsonValue>,
    },
}

impl PublishOutcome {
    pub fn permanent(message: impl Into<String>) -> Self {
        PublishOutcome::Failure {
            message: message.into(),
            retryable: false,
            raw: None,
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        PublishOutcome::Failure {
            message: message.into(),
            retryable: true,
            raw: None,
        }
    }

    /// Failure outcome for a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: Option<JsonValue>) -> Self {
        let detail = body
            .as_ref()
            .and_then(provider_error_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        PublishOutcome::Failure {
            message: format!("provider responded {}: {}", status.as_u16(), detail),
            retryable: is_retryable_status(status),
            raw: body,
        }
    }

    /// Failure outcome for a request that never produced a response.
    pub fn from_transport(error: &reqwest::Error) -> Self {
        PublishOutcome::retryable(format!("transport error: {}", error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Success { .. })
    }
}

/// 5xx, 429 and 408 are worth retrying later; every other status is final.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

/// Best-effort extraction of a provider error message
/// (`{"error": {"message": ..}}`, `{"error": ".."}` or `{"message": ..}`).
pub fn provider_error_message(body: &JsonValue) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("error").filter(|e| e.is_string()))
        .or_else(|| body.get("message"))
        .and_then(JsonValue::as_str)
        .map(String::from)
}

/// Adapter that publishes text to one external platform.
///
/// Implementations never return `Err`: every failure is folded into
/// [`PublishOutcome::Failure`] with the right `retryable` flag.
#[async_trait]
pub trait PublishConnector: Send + Sync {
    /// Connector name for logging
    fn name(&self) -> &'static str;

    /// Publishes one item, as a reply to `reply_to` when given.
    async fn post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        credentials: &PublishCredentials,
    ) -> PublishOutcome;

    async fn publish(&self, text: &str, credentials: &PublishCredentials) -> PublishOutcome {
        self.post(text, None, credentials).await
    }

    /// Publishes `root`, then each reply in order as a reply to the previous
    /// item.
    ///
    /// A failing root is returned unchanged. A failing reply stops the chain
    /// with a permanent failure listing what was already posted, since
    /// retrying would duplicate the root.
    async fn publish_thread(
        &self,
        root: &str,
        replies: &[String],
        credentials: &PublishCredentials,
    ) -> PublishOutcome {
        let (root_id, root_raw) = match self.post(root, None, credentials).await {
            PublishOutcome::Success { external_id, raw } => (external_id, raw),
            failure => return failure,
        };

        let mut posted: Vec<String> = Vec::with_capacity(replies.len());
        let mut parent = root_id.clone();
        for (index, reply) in replies.iter().enumerate() {
            match self.post(reply, Some(&parent), credentials).await {
                PublishOutcome::Success { external_id, .. } => {
                    parent = external_id.clone();
                    posted.push(external_id);
                }
                PublishOutcome::Failure { message, raw, .. } => {
                    return PublishOutcome::Failure {
                        message: format!(
                            "thread stopped at reply {} of {} after root {} (posted replies: [{}]): {}",
                            index + 1,
                            replies.len(),
                            root_id,
                            posted.join(", "),
                            message
                        ),
                        retryable: false,
                        raw: Some(json!({
                            "root_id": root_id,
                            "posted_replies": posted,
                            "failed_index": index,
                            "provider": raw,
                        })),
                    };
                }
            }
        }

        PublishOutcome::Success {
            external_id: root_id.clone(),
            raw: Some(json!({
                "root_id": root_id,
                "reply_ids": posted,
                "root": root_raw,
            })),
        }
    }
}
