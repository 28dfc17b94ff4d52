//! Slotcast
//!
//! Scheduled publishing pipeline: expands workspace scheduling policies into
//! posting slots, pairs slots with pooled content and publishes confirmed
//! schedules from a cron-driven tick.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod jobs;
pub mod logger;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod server;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}
