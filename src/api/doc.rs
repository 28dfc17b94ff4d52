use utoipa::OpenApi;

pub const HEALTH_TAG: &str = "Health";
pub const CRON_TAG: &str = "Cron";
pub const SCHEDULING_TAG: &str = "Scheduling";
pub const SCHEDULES_TAG: &str = "Schedules";
pub const WORKSPACES_TAG: &str = "Workspaces";
pub const CONTENT_TAG: &str = "Content";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Slotcast",
        description = "Scheduled publishing pipeline: slot generation, assignment and cron-driven publishing",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::models::ScheduleStatus,
            crate::models::ContentStatus,
            crate::models::TimeWindow,
        )
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = CRON_TAG, description = "Tick trigger for external schedulers"),
        (name = SCHEDULING_TAG, description = "Slot generation and slot-to-content assignment"),
        (name = SCHEDULES_TAG, description = "Publish intents: confirmation, cancellation and cleanup"),
        (name = WORKSPACES_TAG, description = "Workspaces, scheduling policies and publish credentials"),
        (name = CONTENT_TAG, description = "Content pool items"),
    )
)]
pub struct ApiDoc;
