use axum::http::StatusCode;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    ctx::BaseParams,
    errors::ErrorResponse,
    extract::{Json, Path},
    state::AppState,
    Result,
};

use super::{handlers, CreateTag, ListTagsResponse, Tag, UpdateTag};

const TAG: &str = "tags";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
struct TagIdPath {
    tag_id: Uuid,
}

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_tags, create_tag))
        .routes(routes!(update_tag, remove_tag))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = TAG,
    responses((status = 200, body = ListTagsResponse)),
    security((), ("bearer" = []))
)]
async fn list_tags(base: BaseParams) -> Result<Json<ListTagsResponse>> {
    handlers::list_tags(base).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/api/v1/tags",
    tag = TAG,
    request_body = CreateTag,
    responses(
        (status = 201, body = Tag),
        (status = 409, description = "Tag name already used", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn create_tag(base: BaseParams, Json(args): Json<CreateTag>) -> Result<(StatusCode, Json<Tag>)> {
    handlers::create_tag(args, base)
        .await
        .map(|r| (StatusCode::CREATED, Json(r)))
}

#[utoipa::path(
    put,
    path = "/api/v1/tags/{tag_id}",
    tag = TAG,
    params(TagIdPath),
    request_body = UpdateTag,
    responses(
        (status = 200, body = Tag),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn update_tag(
    Path(TagIdPath { tag_id }): Path<TagIdPath>,
    base: BaseParams,
    Json(args): Json<UpdateTag>,
) -> Result<Json<Tag>> {
    handlers::update_tag(tag_id, args, base).await.map(Json)
}

/// Notes keep their tag names; only the registry entry goes away.
#[utoipa::path(
    delete,
    path = "/api/v1/tags/{tag_id}",
    tag = TAG,
    params(TagIdPath),
    responses((status = 200, body = Tag), (status = 404, body = ErrorResponse)),
    security(("bearer" = []))
)]
async fn remove_tag(Path(TagIdPath { tag_id }): Path<TagIdPath>, base: BaseParams) -> Result<Json<Tag>> {
    handlers::remove_tag(tag_id, base).await.map(Json)
}
