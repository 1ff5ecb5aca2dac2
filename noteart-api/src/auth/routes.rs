use axum::http::{HeaderMap, StatusCode};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    ctx::{bearer_token, BaseParams},
    errors::ErrorResponse,
    extract::Json,
    state::AppState,
    Error, Result,
};

use super::{handlers, CurrentUserResponse, Session, SignOutResponse};

const TAG: &str = "auth";

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(sign_in_anonymously))
        .routes(routes!(current_user))
        .routes(routes!(sign_out))
        .with_state(state)
}

/// Creates an anonymous user and a session for it.
#[utoipa::path(
    post,
    path = "/api/v1/auth/anonymous",
    tag = TAG,
    responses((status = 201, body = Session))
)]
async fn sign_in_anonymously(base: BaseParams) -> Result<(StatusCode, Json<Session>)> {
    handlers::sign_in_anonymously(base)
        .await
        .map(|r| (StatusCode::CREATED, Json(r)))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = TAG,
    responses((status = 200, body = CurrentUserResponse)),
    security((), ("bearer" = []))
)]
async fn current_user(base: BaseParams) -> Result<Json<CurrentUserResponse>> {
    handlers::current_user(base).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-out",
    tag = TAG,
    responses(
        (status = 200, body = SignOutResponse),
        (status = 401, body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn sign_out(headers: HeaderMap, base: BaseParams) -> Result<Json<SignOutResponse>> {
    let token = bearer_token(&headers).ok_or(Error::Unauthenticated)?.to_owned();
    handlers::sign_out(token, base).await.map(Json)
}
