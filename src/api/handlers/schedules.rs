//! Schedule handlers: listing, confirmation, cancellation and cleanup.

use crate::api::doc::SCHEDULES_TAG;
use crate::api::dto::{CleanupQuery, CleanupResponse, ListSchedulesQuery, ScheduleResponse};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ApiPath, ValidatedQuery};
use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

pub fn schedule_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_schedules))
        .routes(routes!(cleanup_failed))
        .routes(routes!(cancel_schedule))
        .routes(routes!(confirm_schedule))
}

/// GET /api/schedules - List schedules, soonest first
#[utoipa::path(
    get,
    path = "/",
    tag = SCHEDULES_TAG,
    params(ListSchedulesQuery),
    responses(
        (status = 200, description = "Schedules with their published records", body = Vec<ScheduleResponse>)
    )
)]
async fn list_schedules(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListSchedulesQuery>,
) -> AppResult<Json<Vec<ScheduleResponse>>> {
    let schedules = state
        .services
        .schedules
        .list_schedules(query.workspace_id, query.status, query.limit)
        .await?;
    Ok(Json(schedules.into_iter().map(ScheduleResponse::from).collect()))
}

/// POST /api/schedules/{id}/confirm - Make a waiting schedule eligible for publishing
#[utoipa::path(
    post,
    path = "/{id}/confirm",
    tag = SCHEDULES_TAG,
    params(
        ("id" = Uuid, Path, description = "Schedule ID")
    ),
    responses(
        (status = 200, description = "Schedule confirmed", body = ScheduleResponse),
        (status = 404, description = "Schedule not found"),
        (status = 409, description = "Already confirmed or no longer waiting")
    )
)]
async fn confirm_schedule(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ScheduleResponse>> {
    let schedule = state.services.schedules.confirm(id).await?;
    Ok(Json(ScheduleResponse::from(schedule)))
}

/// DELETE /api/schedules/{id} - Cancel a waiting content-pool schedule
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = SCHEDULES_TAG,
    params(
        ("id" = Uuid, Path, description = "Schedule ID")
    ),
    responses(
        (status = 204, description = "Schedule cancelled, slot and content released"),
        (status = 404, description = "Schedule not found"),
        (status = 409, description = "Schedule can no longer be cancelled")
    )
)]
async fn cancel_schedule(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    state.services.schedules.cancel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/schedules/failed - Remove failed schedules that never published
#[utoipa::path(
    delete,
    path = "/failed",
    tag = SCHEDULES_TAG,
    params(CleanupQuery),
    responses(
        (status = 200, description = "Failed schedules removed", body = CleanupResponse)
    )
)]
async fn cleanup_failed(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<CleanupQuery>,
) -> AppResult<Json<CleanupResponse>> {
    let deleted = state
        .services
        .schedules
        .cleanup_failed(query.workspace_id)
        .await?;
    Ok(Json(CleanupResponse { deleted }))
}
