//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `content` - Content pool items
//! - `cron` - Tick trigger
//! - `error` - Common error response DTOs
//! - `health` - Health probes
//! - `schedule` - Schedules and their published records
//! - `scheduling` - Slot generation and assignment
//! - `workspace` - Workspaces, policies and credentials

mod content;
mod cron;
mod error;
mod health;
mod schedule;
mod scheduling;
mod workspace;

pub use content::{CreatePostDraftRequest, ListPostDraftsQuery, PostDraftResponse};
pub use cron::{TickQuery, TickResponse};
pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use schedule::{CleanupQuery, CleanupResponse, ListSchedulesQuery, ScheduleResponse};
pub use scheduling::{AssignRequest, GenerateSlotsRequest, GenerateSlotsResponse};
pub use workspace::{
    CreateWorkspaceRequest, CredentialsRequest, CredentialsResponse, PolicyResponse,
    WorkspaceResponse,
};
