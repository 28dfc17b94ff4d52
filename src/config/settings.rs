//! Configuration settings structures for slotcast
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "slotcast".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_keep_alive_timeout() -> u64 {
    75
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/slotcast.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_max_files() -> usize {
    5
}

fn default_cron_expression() -> String {
    // sec min hour day month weekday
    "0 */5 * * * *".to_string()
}

fn default_tick_limit() -> i64 {
    20
}

fn default_assign_limit() -> i64 {
    50
}

fn default_max_assign_limit() -> i64 {
    500
}

fn default_max_range_days() -> u32 {
    366
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}

fn default_threads_api_base() -> String {
    "https://graph.threads.net/v1.0".to_string()
}

fn default_publish_timeout() -> u64 {
    30
}

fn default_publish_retries() -> u32 {
    3
}

fn default_publish_retry_delay_ms() -> u64 {
    1000
}

/// Upper bound for one tick; larger requests are clamped.
pub const MAX_TICK_LIMIT: i64 = 50;

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keep_alive_timeout")]
    pub keep_alive_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            keep_alive_timeout: default_keep_alive_timeout(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Which store implementation backs the scheduling pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local store; state is lost on exit.
    Memory,
}

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store backend
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Whether to automatically run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// Size-based rotation settings for file logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// Maximum file size in bytes before rotation
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Maximum number of rotated files to keep
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            max_files: default_max_files(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Rotation settings
    #[serde(default)]
    pub rotation: RotationSettings,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
            rotation: RotationSettings::default(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level).map_err(|e| {
            ConfigError::ValidationError {
                field: "logger".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl FileSettings {
    /// Convert FileSettings to FileConfig
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })?;
        let rotation = RotationConfig::new(self.rotation.max_size, self.rotation.max_files)
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.rotation".to_string(),
                message: e.to_string(),
            })?;

        FileConfig::new(
            self.enabled,
            PathBuf::from(self.path),
            self.append,
            format,
            rotation,
        )
        .map_err(|e| ConfigError::ValidationError {
            field: "logger.file".to_string(),
            message: e.to_string(),
        })
    }
}

// ============================================================================
// Cron Configuration
// ============================================================================

/// Tick trigger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronConfig {
    /// Shared secret required by the tick endpoint when set
    #[serde(default)]
    pub secret: Option<String>,

    /// Whether the in-process scheduler triggers ticks
    #[serde(default)]
    pub enabled: bool,

    /// Six-field cron expression (with seconds)
    #[serde(default = "default_cron_expression")]
    pub expression: String,

    /// Due schedules handled per scheduled tick
    #[serde(default = "default_tick_limit")]
    pub tick_limit: i64,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: None,
            enabled: false,
            expression: default_cron_expression(),
            tick_limit: default_tick_limit(),
        }
    }
}

impl CronConfig {
    /// The configured secret, ignoring blank values.
    pub fn secret(&self) -> Option<&str> {
        self.secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_limit < 1 || self.tick_limit > MAX_TICK_LIMIT {
            return Err(ConfigError::validation(
                "cron.tick_limit".to_string(),
                format!("Tick limit must be between 1 and {}", MAX_TICK_LIMIT),
            ));
        }
        if self.enabled && self.expression.split_whitespace().count() != 6 {
            return Err(ConfigError::validation(
                "cron.expression",
                "Cron expression must have six fields (sec min hour day month weekday)",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Scheduling Configuration
// ============================================================================

/// Slot generation and assignment limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Pairs attempted by one assign call when no limit is given
    #[serde(default = "default_assign_limit")]
    pub default_assign_limit: i64,

    /// Upper bound for a requested assign limit
    #[serde(default = "default_max_assign_limit")]
    pub max_assign_limit: i64,

    /// Longest accepted policy date range, in days
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_assign_limit: default_assign_limit(),
            max_assign_limit: default_max_assign_limit(),
            max_range_days: default_max_range_days(),
        }
    }
}

impl SchedulingConfig {
    /// Resolves a requested assign limit against the configured bounds.
    pub fn assign_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_assign_limit)
            .clamp(1, self.max_assign_limit)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_assign_limit < 1 {
            return Err(ConfigError::validation(
                "scheduling.default_assign_limit",
                "Default assign limit must be positive",
            ));
        }
        if self.max_assign_limit < self.default_assign_limit {
            return Err(ConfigError::validation(
                "scheduling.max_assign_limit",
                "Max assign limit cannot be lower than the default",
            ));
        }
        if self.max_range_days == 0 {
            return Err(ConfigError::validation(
                "scheduling.max_range_days",
                "Max range must be at least one day",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Publishing Configuration
// ============================================================================

/// Threads API connector settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadsConfig {
    /// Graph API base URL
    #[serde(default = "default_threads_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_publish_timeout")]
    pub timeout_seconds: u64,

    /// Extra publish attempts while a container is not ready
    #[serde(default = "default_publish_retries")]
    pub publish_retries: u32,

    /// Base delay between publish attempts; multiplied by the attempt number
    #[serde(default = "default_publish_retry_delay_ms")]
    pub publish_retry_delay_ms: u64,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            api_base: default_threads_api_base(),
            timeout_seconds: default_publish_timeout(),
            publish_retries: default_publish_retries(),
            publish_retry_delay_ms: default_publish_retry_delay_ms(),
        }
    }
}

impl ThreadsConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.publish_retry_delay_ms)
    }
}

/// Generic webhook connector settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPublisherConfig {
    /// Target URL; the connector is disabled when unset
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_publish_timeout")]
    pub timeout_seconds: u64,

    /// Platform names routed to the webhook
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl Default for WebhookPublisherConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: default_publish_timeout(),
            platforms: Vec::new(),
        }
    }
}

/// Tick processor and connector settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishingConfig {
    /// Attempts per schedule for transient storage failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit between attempts, in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Reclaim schedules stuck in posting for longer than this; 0 disables
    #[serde(default)]
    pub stale_posting_minutes: i64,

    #[serde(default)]
    pub threads: ThreadsConfig,

    #[serde(default)]
    pub webhook: WebhookPublisherConfig,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            stale_posting_minutes: 0,
            threads: ThreadsConfig::default(),
            webhook: WebhookPublisherConfig::default(),
        }
    }
}

impl PublishingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::validation(
                "publishing.max_attempts",
                "At least one attempt is required",
            ));
        }
        if self.stale_posting_minutes < 0 {
            return Err(ConfigError::validation(
                "publishing.stale_posting_minutes",
                "Stale posting window cannot be negative",
            ));
        }
        if !self.threads.api_base.starts_with("http://")
            && !self.threads.api_base.starts_with("https://")
        {
            return Err(ConfigError::validation(
                "publishing.threads.api_base",
                "API base must be an http(s) URL",
            ));
        }
        if self.threads.timeout_seconds == 0 || self.webhook.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "publishing",
                "Connector timeouts must be positive",
            ));
        }
        if let Some(url) = &self.webhook.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::validation(
                    "publishing.webhook.url",
                    "Webhook URL must be an http(s) URL",
                ));
            }
            if self.webhook.platforms.is_empty() {
                return Err(ConfigError::validation(
                    "publishing.webhook.platforms",
                    "Webhook URL is set but no platforms are routed to it",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// This structure represents the entire configuration that can be loaded
/// from TOML files and environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,

    /// Tick trigger configuration
    #[serde(default)]
    pub cron: CronConfig,

    /// Slot generation and assignment configuration
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Tick processor and connector configuration
    #[serde(default)]
    pub publishing: PublishingConfig,
}
