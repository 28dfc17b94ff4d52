use std::time::Duration;

use crate::error::{AppError, AppResult};

/// User-Agent sent to publishing providers.
pub fn user_agent() -> String {
    format!("slotcast/{}", crate::pkg_version())
}

/// Builds the HTTP client shared by the publish connectors.
///
/// One client is constructed at startup and handed to each connector, so
/// connection pools are shared and tests can point connectors at a local
/// server.
///
/// # Features
/// - **Timeouts**: `timeout` per request, 10s connect timeout
/// - **Compression**: gzip and brotli
/// - **HTTP/2**: adaptive window sizing and keep-alive
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        // Timeouts
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        .gzip(true)
        .brotli(true)
        .user_agent(user_agent())
        .build()
        .map_err(|e| AppError::Configuration {
            key: "publishing".to_string(),
            source: anyhow::Error::from(e),
        })
}
