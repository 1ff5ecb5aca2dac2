use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_SECURITY_POLICY, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    config,
    ctx::BaseParams,
    errors::ErrorResponse,
    extract::{Json, Path},
    state::AppState,
    Result, DB,
};

use super::{
    handlers::{self, DEFAULT_CONTENT_TYPE},
    UploadResponse, UploadUrlResponse,
};

const TAG: &str = "storage";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
struct UploadTokenPath {
    token: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
struct StorageIdPath {
    storage_id: Uuid,
}

pub fn router(state: AppState) -> OpenApiRouter {
    let uploads = OpenApiRouter::new()
        .routes(routes!(upload))
        .layer(DefaultBodyLimit::max(config().max_upload_bytes));

    OpenApiRouter::new()
        .routes(routes!(generate_upload_url))
        .routes(routes!(get_blob))
        .merge(uploads)
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/storage/upload-url",
    tag = TAG,
    responses((status = 200, body = UploadUrlResponse), (status = 401, body = ErrorResponse)),
    security(("bearer" = []))
)]
async fn generate_upload_url(base: BaseParams) -> Result<Json<UploadUrlResponse>> {
    handlers::generate_upload_url(base).await.map(Json)
}

/// Accepts the raw file body. The token in the path is the only credential.
#[utoipa::path(
    post,
    path = "/api/v1/storage/upload/{token}",
    tag = TAG,
    params(UploadTokenPath),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses((status = 200, body = UploadResponse), (status = 400, body = ErrorResponse))
)]
async fn upload(
    Path(UploadTokenPath { token }): Path<UploadTokenPath>,
    Extension(db): Extension<DB>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    handlers::upload(token, content_type, body, db).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/api/v1/storage/{storage_id}",
    tag = TAG,
    params(StorageIdPath),
    responses(
        (status = 200, content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, body = ErrorResponse)
    )
)]
async fn get_blob(
    Path(StorageIdPath { storage_id }): Path<StorageIdPath>,
    Extension(db): Extension<DB>,
) -> Result<Response> {
    let blob = handlers::get_blob(storage_id, db).await?;
    let opaque = HeaderValue::from_static(DEFAULT_CONTENT_TYPE);

    let (content_type, disposition) = if blob.is_inline() {
        let content_type = HeaderValue::from_str(&blob.content_type).unwrap_or(opaque);
        (content_type, HeaderValue::from_static("inline"))
    } else {
        (opaque, HeaderValue::from_static("attachment"))
    };

    let headers = [
        (CONTENT_TYPE, content_type),
        (CONTENT_DISPOSITION, disposition),
        (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (CONTENT_SECURITY_POLICY, HeaderValue::from_static("sandbox")),
    ];
    Ok((headers, blob.data).into_response())
}
