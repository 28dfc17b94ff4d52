//! Generic webhook publish connector.
//!
//! Posts `{text, account_id, reply_to}` as JSON to a fixed URL with the
//! workspace access token as bearer auth, and expects `{"id": ...}` back.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use super::connector::{PublishConnector, PublishOutcome};
use crate::models::PublishCredentials;

pub struct WebhookConnector {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct WebhookReply {
    id: JsonValue,
}

impl WebhookConnector {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PublishConnector for WebhookConnector {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        credentials: &PublishCredentials,
    ) -> PublishOutcome {
        let response = match self
            .client
            .post(&self.url)
            .bearer_auth(&credentials.access_token)
            .json(&json!({
                "text": text,
                "account_id": credentials.account_id,
                "reply_to": reply_to,
            }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return PublishOutcome::from_transport(&e),
        };

        let status = response.status();
        let body: Option<JsonValue> = response
            .text()
            .await
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok());

        if !status.is_success() {
            return PublishOutcome::from_status(status, body);
        }

        let external_id = body
            .clone()
            .and_then(|value| serde_json::from_value::<WebhookReply>(value).ok())
            .and_then(|reply| match reply.id {
                JsonValue::String(id) if !id.is_empty() => Some(id),
                JsonValue::Number(id) => Some(id.to_string()),
                _ => None,
            });

        match external_id {
            Some(external_id) => PublishOutcome::Success {
                external_id,
                raw: body,
            },
            None => PublishOutcome::Failure {
                message: "webhook response did not include an id".to_string(),
                retryable: false,
                raw: body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/hook", addr)
    }

    fn credentials() -> PublishCredentials {
        PublishCredentials {
            access_token: "tok".to_string(),
            account_id: "acct".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_returns_id() {
        let url = spawn(Router::new().route(
            "/hook",
            post(|Json(body): Json<JsonValue>| async move {
                Json(json!({"id": format!("ext-{}", body["account_id"].as_str().unwrap())}))
            }),
        ))
        .await;

        let outcome = WebhookConnector::new(Client::new(), url)
            .publish("hi", &credentials())
            .await;

        match outcome {
            PublishOutcome::Success { external_id, .. } => assert_eq!(external_id, "ext-acct"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_retryable() {
        let url = spawn(Router::new().route(
            "/hook",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        ))
        .await;

        let outcome = WebhookConnector::new(Client::new(), url)
            .publish("hi", &credentials())
            .await;

        match outcome {
            PublishOutcome::Failure { retryable, .. } => assert!(retryable),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_id_is_permanent() {
        let url = spawn(Router::new().route(
            "/hook",
            post(|| async { Json(json!({"ok": true})) }),
        ))
        .await;

        let outcome = WebhookConnector::new(Client::new(), url)
            .publish("hi", &credentials())
            .await;

        match outcome {
            PublishOutcome::Failure { retryable, .. } => assert!(!retryable),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
