//! Slot generation and assignment handlers.

use crate::api::doc::SCHEDULING_TAG;
use crate::api::dto::{AssignRequest, GenerateSlotsRequest, GenerateSlotsResponse};
use crate::error::AppResult;
use crate::services::scheduling::AssignReport;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;
use axum::{Json, extract::State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn scheduling_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(generate_slots))
        .routes(routes!(assign))
}

/// POST /api/scheduling/slots/generate - Expand the workspace policy into slots
///
/// Idempotent: slots that already exist are skipped and not counted in
/// `created`.
#[utoipa::path(
    post,
    path = "/slots/generate",
    tag = SCHEDULING_TAG,
    request_body = GenerateSlotsRequest,
    responses(
        (status = 200, description = "Slots generated", body = GenerateSlotsResponse),
        (status = 400, description = "Workspace has no usable policy"),
        (status = 404, description = "Workspace not found")
    )
)]
async fn generate_slots(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<GenerateSlotsRequest>,
) -> AppResult<Json<GenerateSlotsResponse>> {
    let report = state
        .services
        .scheduling
        .generate_slots(req.workspace_id)
        .await?;
    Ok(Json(report.into()))
}

/// POST /api/scheduling/assign - Pair open slots with pool content
#[utoipa::path(
    post,
    path = "/assign",
    tag = SCHEDULING_TAG,
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Assignment run finished", body = AssignReport),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Workspace not found")
    )
)]
async fn assign(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AssignRequest>,
) -> AppResult<Json<AssignReport>> {
    let report = state
        .services
        .scheduling
        .assign(req.workspace_id, req.platform.as_deref(), req.limit)
        .await?;
    Ok(Json(report))
}
