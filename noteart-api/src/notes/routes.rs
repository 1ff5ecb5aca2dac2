use axum::http::StatusCode;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    ctx::BaseParams,
    errors::ErrorResponse,
    extract::{Json, Path, Query},
    state::AppState,
    Result,
};

use super::{handlers, CreateNote, FindNotesQuery, FindNotesResponse, Note, NoteView, UpdateNote};

const TAG: &str = "notes";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub(crate) struct NoteIdPath {
    pub note_id: Uuid,
}

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(find_notes, create_note))
        .routes(routes!(get_note, update_note, remove_note))
        .with_state(state)
}

/// Lists the caller's notes newest first, or searches their content when `query` is set.
#[utoipa::path(
    get,
    path = "/api/v1/notes",
    tag = TAG,
    params(FindNotesQuery),
    responses((status = 200, body = FindNotesResponse)),
    security((), ("bearer" = []))
)]
async fn find_notes(Query(query): Query<FindNotesQuery>, base: BaseParams) -> Result<Json<FindNotesResponse>> {
    handlers::find_notes(query, base).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/api/v1/notes",
    tag = TAG,
    request_body = CreateNote,
    responses(
        (status = 201, body = NoteView),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn create_note(base: BaseParams, Json(args): Json<CreateNote>) -> Result<(StatusCode, Json<NoteView>)> {
    handlers::create_note(args, base)
        .await
        .map(|r| (StatusCode::CREATED, Json(r)))
}

#[utoipa::path(
    get,
    path = "/api/v1/notes/{note_id}",
    tag = TAG,
    params(NoteIdPath),
    responses((status = 200, body = NoteView), (status = 404, body = ErrorResponse)),
    security(("bearer" = []))
)]
async fn get_note(Path(NoteIdPath { note_id }): Path<NoteIdPath>, base: BaseParams) -> Result<Json<NoteView>> {
    handlers::get_note(note_id, base).await.map(Json)
}

#[utoipa::path(
    put,
    path = "/api/v1/notes/{note_id}",
    tag = TAG,
    params(NoteIdPath),
    request_body = UpdateNote,
    responses(
        (status = 200, body = NoteView),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn update_note(
    Path(NoteIdPath { note_id }): Path<NoteIdPath>,
    base: BaseParams,
    Json(args): Json<UpdateNote>,
) -> Result<Json<NoteView>> {
    handlers::update_note(note_id, args, base).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/api/v1/notes/{note_id}",
    tag = TAG,
    params(NoteIdPath),
    responses((status = 200, body = Note), (status = 404, body = ErrorResponse)),
    security(("bearer" = []))
)]
async fn remove_note(Path(NoteIdPath { note_id }): Path<NoteIdPath>, base: BaseParams) -> Result<Json<Note>> {
    handlers::remove_note(note_id, base).await.map(Json)
}
