//! Threads (Graph-style) publish connector.
//!
//! Publishing is two-phase: a media container is created first and then
//! published by id. The publish call can answer "not found" for a short while
//! after the container was created, so that phase is retried with an
//! increasing delay.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::{Value as JsonValue, json};

use super::connector::{PublishConnector, PublishOutcome, provider_error_message};
use crate::models::PublishCredentials;

pub struct ThreadsConnector {
    client: Client,
    api_base: String,
    publish_retries: u32,
    retry_delay: Duration,
}

/// Status and parsed JSON body of a provider response.
struct ProviderResponse {
    status: StatusCode,
    body: Option<JsonValue>,
}

impl ThreadsConnector {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        publish_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            publish_retries,
            retry_delay,
        }
    }

    fn endpoint(&self, account_id: &str, path: &str) -> String {
        format!("{}/{}/{}", self.api_base, account_id, path)
    }

    async fn send(request: RequestBuilder) -> Result<ProviderResponse, PublishOutcome> {
        let response = request
            .send()
            .await
            .map_err(|e| PublishOutcome::from_transport(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .ok()
            .and_then(|text| serde_json::from_str::<JsonValue>(&text).ok());
        Ok(ProviderResponse { status, body })
    }

    /// Phase one: creates the text container and returns its id.
    async fn create_container(
        &self,
        text: &str,
        reply_to: Option<&str>,
        credentials: &PublishCredentials,
    ) -> Result<String, PublishOutcome> {
        let mut payload = json!({
            "media_type": "TEXT",
            "text": text,
        });
        if let Some(parent) = reply_to {
            payload["reply_to_id"] = json!(parent);
        }

        let request = self
            .client
            .post(self.endpoint(&credentials.account_id, "threads"))
            .bearer_auth(&credentials.access_token)
            .json(&payload);
        let response = Self::send(request).await?;

        if !response.status.is_success() {
            return Err(PublishOutcome::from_status(response.status, response.body));
        }
        response_id(response.body.as_ref())
            .ok_or_else(|| PublishOutcome::permanent("container response did not include an id"))
    }

    /// Phase two: publishes a created container.
    async fn publish_container(
        &self,
        creation_id: &str,
        credentials: &PublishCredentials,
    ) -> PublishOutcome {
        let mut url = match Url::parse(&self.endpoint(&credentials.account_id, "threads_publish")) {
            Ok(url) => url,
            Err(e) => return PublishOutcome::permanent(format!("invalid threads api url: {}", e)),
        };
        url.query_pairs_mut().append_pair("creation_id", creation_id);

        let mut attempt = 0;
        loop {
            let request = self
                .client
                .post(url.clone())
                .bearer_auth(&credentials.access_token);
            let response = match Self::send(request).await {
                Ok(response) => response,
                Err(outcome) => return outcome,
            };

            if response.status.is_success() {
                return match response_id(response.body.as_ref()) {
                    Some(external_id) => PublishOutcome::Success {
                        external_id,
                        raw: response.body,
                    },
                    None => PublishOutcome::permanent("publish response did not include an id"),
                };
            }

            if attempt < self.publish_retries && is_not_ready(&response) {
                attempt += 1;
                tracing::debug!(
                    creation_id = %creation_id,
                    attempt = attempt,
                    "Threads container not ready, retrying publish"
                );
                tokio::time::sleep(self.retry_delay * attempt).await;
                continue;
            }

            return PublishOutcome::from_status(response.status, response.body);
        }
    }
}

fn response_id(body: Option<&JsonValue>) -> Option<String> {
    match body?.get("id")? {
        JsonValue::String(id) if !id.is_empty() => Some(id.clone()),
        JsonValue::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// A freshly created container may briefly be reported as missing.
fn is_not_ready(response: &ProviderResponse) -> bool {
    if response.status == StatusCode::NOT_FOUND {
        return true;
    }
    if response.status != StatusCode::BAD_REQUEST {
        return false;
    }
    response
        .body
        .as_ref()
        .and_then(provider_error_message)
        .map(|message| {
            let message = message.to_lowercase();
            message.contains("not found")
                || message.contains("does not exist")
                || message.contains("not ready")
        })
        .unwrap_or(false)
}

#[async_trait]
impl PublishConnector for ThreadsConnector {
    fn name(&self) -> &'static str {
        "threads"
    }

    async fn post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        credentials: &PublishCredentials,
    ) -> PublishOutcome {
        let creation_id = match self.create_container(text, reply_to, credentials).await {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        self.publish_container(&creation_id, credentials).await
    }
}
