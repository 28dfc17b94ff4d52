//! Content pool handlers.

use crate::api::doc::CONTENT_TAG;
use crate::api::dto::{CreatePostDraftRequest, ListPostDraftsQuery, PostDraftResponse};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};
use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const DEFAULT_LIST_LIMIT: i64 = 100;

pub fn post_draft_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(list_post_drafts, create_post_draft))
}

/// POST /api/post-drafts - Add an item to the content pool
#[utoipa::path(
    post,
    path = "/",
    tag = CONTENT_TAG,
    request_body = CreatePostDraftRequest,
    responses(
        (status = 201, description = "Content item created", body = PostDraftResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Workspace not found")
    )
)]
async fn create_post_draft(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePostDraftRequest>,
) -> AppResult<(StatusCode, Json<PostDraftResponse>)> {
    let draft = state
        .services
        .content
        .create_post_draft(req.workspace_id, &req.platform, &req.body, req.thread_replies)
        .await?;
    Ok((StatusCode::CREATED, Json(PostDraftResponse::from(draft))))
}

/// GET /api/post-drafts - List content pool items, oldest first
#[utoipa::path(
    get,
    path = "/",
    tag = CONTENT_TAG,
    params(ListPostDraftsQuery),
    responses(
        (status = 200, description = "Content items", body = Vec<PostDraftResponse>)
    )
)]
async fn list_post_drafts(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListPostDraftsQuery>,
) -> AppResult<Json<Vec<PostDraftResponse>>> {
    let drafts = state
        .services
        .content
        .list_post_drafts(
            query.workspace_id,
            query.status,
            query.platform.as_deref(),
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        )
        .await?;
    Ok(Json(drafts.into_iter().map(PostDraftResponse::from).collect()))
}
