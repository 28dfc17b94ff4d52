//! Workspace, scheduling policy and credential handlers.

use crate::api::doc::WORKSPACES_TAG;
use crate::api::dto::{
    CreateWorkspaceRequest, CredentialsRequest, CredentialsResponse, PolicyResponse,
    WorkspaceResponse,
};
use crate::error::AppResult;
use crate::models::SchedulingPolicy;
use crate::state::AppState;
use crate::utils::validate::{ApiJson, ApiPath, ValidatedJson};
use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

pub fn workspace_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create_workspace))
        .routes(routes!(get_workspace))
        .routes(routes!(get_policy, put_policy))
        .routes(routes!(put_credentials))
}

/// POST /api/workspaces - Create a workspace
#[utoipa::path(
    post,
    path = "/",
    tag = WORKSPACES_TAG,
    request_body = CreateWorkspaceRequest,
    responses(
        (status = 201, description = "Workspace created", body = WorkspaceResponse),
        (status = 400, description = "Invalid name or policy")
    )
)]
async fn create_workspace(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateWorkspaceRequest>,
) -> AppResult<(StatusCode, Json<WorkspaceResponse>)> {
    let workspace = state
        .services
        .workspaces
        .create_workspace(&req.name, req.scheduling_policy)
        .await?;
    Ok((StatusCode::CREATED, Json(WorkspaceResponse::from(workspace))))
}

/// GET /api/workspaces/{id} - Get a workspace
#[utoipa::path(
    get,
    path = "/{id}",
    tag = WORKSPACES_TAG,
    params(
        ("id" = Uuid, Path, description = "Workspace ID")
    ),
    responses(
        (status = 200, description = "Workspace found", body = WorkspaceResponse),
        (status = 404, description = "Workspace not found")
    )
)]
async fn get_workspace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<WorkspaceResponse>> {
    let workspace = state.services.workspaces.get_workspace(id).await?;
    Ok(Json(WorkspaceResponse::from(workspace)))
}

/// GET /api/workspaces/{id}/policy - Read the scheduling policy
#[utoipa::path(
    get,
    path = "/{id}/policy",
    tag = WORKSPACES_TAG,
    params(
        ("id" = Uuid, Path, description = "Workspace ID")
    ),
    responses(
        (status = 200, description = "Stored policy, or configured=false", body = PolicyResponse),
        (status = 404, description = "Workspace not found")
    )
)]
async fn get_policy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<PolicyResponse>> {
    let view = state.services.workspaces.get_policy(id).await?;
    Ok(Json(view.into()))
}

/// PUT /api/workspaces/{id}/policy - Replace the scheduling policy
#[utoipa::path(
    put,
    path = "/{id}/policy",
    tag = WORKSPACES_TAG,
    params(
        ("id" = Uuid, Path, description = "Workspace ID")
    ),
    request_body = SchedulingPolicy,
    responses(
        (status = 200, description = "Policy stored", body = PolicyResponse),
        (status = 400, description = "Policy failed validation"),
        (status = 404, description = "Workspace not found")
    )
)]
async fn put_policy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(policy): ApiJson<SchedulingPolicy>,
) -> AppResult<Json<PolicyResponse>> {
    let view = state.services.workspaces.put_policy(id, policy).await?;
    Ok(Json(view.into()))
}

/// PUT /api/workspaces/{id}/credentials/{platform} - Store publish credentials
#[utoipa::path(
    put,
    path = "/{id}/credentials/{platform}",
    tag = WORKSPACES_TAG,
    params(
        ("id" = Uuid, Path, description = "Workspace ID"),
        ("platform" = String, Path, description = "Platform name, e.g. threads")
    ),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Credentials stored", body = CredentialsResponse),
        (status = 400, description = "Invalid credentials"),
        (status = 404, description = "Workspace not found")
    )
)]
async fn put_credentials(
    State(state): State<AppState>,
    ApiPath((id, platform)): ApiPath<(Uuid, String)>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> AppResult<Json<CredentialsResponse>> {
    let credentials = state
        .services
        .workspaces
        .put_credentials(id, &platform, &req.access_token, &req.account_id)
        .await?;
    Ok(Json(credentials.into()))
}
