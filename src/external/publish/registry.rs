//! Platform name to connector lookup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::connector::PublishConnector;
use super::threads::ThreadsConnector;
use super::webhook::WebhookConnector;
use crate::config::PublishingConfig;
use crate::error::AppResult;
use crate::external::client::build_http_client;

/// Platform name the Threads connector is registered under.
pub const THREADS_PLATFORM: &str = "threads";

#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn PublishConnector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `connector` for `platform`, replacing any previous one.
    pub fn register(&mut self, platform: impl Into<String>, connector: Arc<dyn PublishConnector>) {
        self.connectors
            .insert(platform.into().to_lowercase(), connector);
    }

    pub fn with(mut self, platform: impl Into<String>, connector: Arc<dyn PublishConnector>) -> Self {
        self.register(platform, connector);
        self
    }

    pub fn get(&self, platform: &str) -> Option<Arc<dyn PublishConnector>> {
        self.connectors.get(&platform.to_lowercase()).cloned()
    }

    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self.connectors.keys().cloned().collect();
        platforms.sort();
        platforms
    }

    /// Builds the registry from configuration: Threads is always available,
    /// the webhook connector serves its configured platforms when a URL is set.
    pub fn from_settings(config: &PublishingConfig) -> AppResult<Self> {
        let threads_client =
            build_http_client(Duration::from_secs(config.threads.timeout_seconds))?;
        let mut registry = Self::new().with(
            THREADS_PLATFORM,
            Arc::new(ThreadsConnector::new(
                threads_client,
                config.threads.api_base.clone(),
                config.threads.publish_retries,
                config.threads.retry_delay(),
            )),
        );

        if let Some(url) = &config.webhook.url {
            let client = build_http_client(Duration::from_secs(config.webhook.timeout_seconds))?;
            let webhook: Arc<dyn PublishConnector> =
                Arc::new(WebhookConnector::new(client, url.clone()));
            for platform in &config.webhook.platforms {
                registry.register(platform.clone(), webhook.clone());
            }
        }

        Ok(registry)
    }
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::WebhookPublisherConfig;

    #[test]
    fn test_default_registry_has_threads() {
        let registry = ConnectorRegistry::from_settings(&PublishingConfig::default()).unwrap();
        assert_eq!(registry.platforms(), vec!["threads".to_string()]);
        assert_eq!(registry.get("Threads").unwrap().name(), "threads");
        assert!(registry.get("x").is_none());
    }

    #[test]
    fn test_webhook_platforms_registered() {
        let config = PublishingConfig {
            webhook: WebhookPublisherConfig {
                url: Some("https://hooks.example.com/post".to_string()),
                platforms: vec!["x".to_string(), "bluesky".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let registry = ConnectorRegistry::from_settings(&config).unwrap();

        assert_eq!(
            registry.platforms(),
            vec!["bluesky".to_string(), "threads".to_string(), "x".to_string()]
        );
        assert_eq!(registry.get("x").unwrap().name(), "webhook");
    }
}
