//! Cron trigger handler.
//!
//! External schedulers hit `/api/cron/tick`; when `cron.secret` is set the
//! caller must present it as a bearer token, an `x-cron-secret` header or a
//! `secret` query parameter.

use crate::api::doc::CRON_TAG;
use crate::api::dto::{TickQuery, TickResponse};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::utils::validate::ValidatedQuery;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Header carrying the cron secret when bearer auth is not convenient.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

pub fn cron_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(tick_get, tick_post))
}

/// GET /api/cron/tick - Run one tick
#[utoipa::path(
    get,
    path = "/tick",
    tag = CRON_TAG,
    params(TickQuery),
    responses(
        (status = 200, description = "Tick completed", body = TickResponse),
        (status = 401, description = "Missing or wrong cron secret"),
        (status = 500, description = "Tick failed before processing schedules")
    )
)]
async fn tick_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedQuery(query): ValidatedQuery<TickQuery>,
) -> AppResult<Json<TickResponse>> {
    run_tick(state, &headers, query).await
}

/// POST /api/cron/tick - Run one tick
#[utoipa::path(
    post,
    path = "/tick",
    tag = CRON_TAG,
    params(TickQuery),
    responses(
        (status = 200, description = "Tick completed", body = TickResponse),
        (status = 401, description = "Missing or wrong cron secret"),
        (status = 500, description = "Tick failed before processing schedules")
    )
)]
async fn tick_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedQuery(query): ValidatedQuery<TickQuery>,
) -> AppResult<Json<TickResponse>> {
    run_tick(state, &headers, query).await
}

async fn run_tick(
    state: AppState,
    headers: &HeaderMap,
    query: TickQuery,
) -> AppResult<Json<TickResponse>> {
    if let Some(expected) = state.cron.secret() {
        authorize(expected, headers, query.secret.as_deref())?;
    }

    let report = state.services.publishing.tick(query.limit).await?;
    Ok(Json(TickResponse::from(report)))
}

fn authorize(expected: &str, headers: &HeaderMap, query_secret: Option<&str>) -> AppResult<()> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    let custom = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    let presented = [bearer, custom, query_secret];
    if presented.iter().flatten().any(|secret| *secret == expected) {
        return Ok(());
    }

    tracing::warn!("Rejected cron tick with missing or wrong secret");
    Err(AppError::Unauthorized {
        message: "invalid cron secret".to_string(),
    })
}
