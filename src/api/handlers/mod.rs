//! HTTP request handlers for API endpoints.
//!
//! This module contains all request handlers organized by resource type.

pub mod cron;
pub mod health;
pub mod post_drafts;
pub mod schedules;
pub mod scheduling;
pub mod workspaces;
