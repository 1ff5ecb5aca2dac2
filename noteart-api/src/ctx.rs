use axum::{
    extract::{Extension, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{self, User, UserId},
    Error, Result, DB,
};

#[derive(Clone, Debug, FromRequestParts)]
pub struct BaseParams {
    pub ctx: Ctx,
    #[from_request(via(Extension))]
    pub db: DB,
}

impl BaseParams {
    pub fn new(db: DB, ctx: Ctx) -> Self {
        Self { db, ctx }
    }
}

/// Identity resolved for the current request.
#[derive(Clone, Debug)]
pub struct Ctx {
    pub user: Option<User>,
}

impl Ctx {
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }

    pub fn get_user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Mutations call this first; without an identity they must not proceed.
    pub fn require_user_id(&self) -> Result<UserId> {
        self.get_user_id().ok_or(Error::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<Ctx>() {
            return Ok(ctx.clone());
        }

        let Some(db) = parts.extensions.get::<DB>().cloned() else {
            return Ok(Ctx::new(None));
        };
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(Ctx::new(None));
        };

        let user = auth::handlers::resolve_identity(&db, token.to_owned()).await?;

        Ok(Ctx::new(user))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the identity once per request so handlers reuse it.
pub async fn with_ctx(ctx: Ctx, mut request: Request, next: Next) -> Response {
    if let Some(user_id) = ctx.get_user_id() {
        tracing::debug!(%user_id, "resolved identity");
    }
    request.extensions_mut().insert(ctx);
    next.run(request).await
}
