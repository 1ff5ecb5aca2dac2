use axum::{middleware, response::IntoResponse, routing::get, Extension, Json, Router};
use rand::Rng;
use serde_json::json;
use tower::ServiceBuilder;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    config,
    ctx::with_ctx,
    db::DB,
    errors::{self, on_error},
    generation::ImageGateway,
    openapi::{ApiDoc, OpenApiSpec},
    state::AppState,
};

pub struct AppParams<R>
where
    R: FnOnce(AppState) -> OpenApiRouter,
{
    pub db: DB,
    pub images: ImageGateway,
    pub router: R,
}

pub async fn create<R>(AppParams { db, images, router }: AppParams<R>) -> errors::Result<(Router, OpenApiSpec)>
where
    R: FnOnce(AppState) -> OpenApiRouter,
{
    let state = AppState {
        conn: db.clone(),
        images,
    };

    let (api_router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(router(state))
        .split_for_parts();

    let spec = api.clone();
    let app = api_router
        .route("/__version__", get(version))
        .route("/__heartbeat__", get(heartbeat))
        .route("/__lbheartbeat__", get(lbheartbeat))
        .route("/__docs__/spec.json", get(move || async move { Json(spec) }))
        .merge(Scalar::with_url("/__docs__", api.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(db))
                .layer(middleware::from_fn(with_ctx))
                .layer(middleware::from_fn(on_error)),
        );

    Ok((app, api))
}

async fn version() -> impl IntoResponse {
    let config = &config();
    Json(json!({
        "source" : config.source,
        "version": config.app_version.as_deref().unwrap_or(&config.version),
        "commit" : config.git_commit,
        "build"  : config.pipeline_id
    }))
}

async fn heartbeat() -> impl IntoResponse {
    let mut rng = rand::thread_rng();
    let random: u32 = rng.gen_range(0..=10000);

    Json(json!({
        "status" : "ok",
        "random": random,
    }))
}

async fn lbheartbeat() -> impl IntoResponse {
    ""
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::Value;
    use utoipa_axum::router::OpenApiRouter;

    use crate::{
        db::{init_test_db, DB},
        errors::Result,
        state::AppState,
    };

    fn api(state: AppState) -> OpenApiRouter {
        crate::api_router(state)
    }

    #[tokio::test]
    async fn service_endpoints() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;

        assert_eq!(server.get("/__lbheartbeat__").await.status_code(), 200);
        let heartbeat = server.get("/__heartbeat__").await.json::<Value>();
        assert_eq!(heartbeat["status"], "ok");
        assert_eq!(server.get("/__version__").await.status_code(), 200);
        Ok(())
    }

    #[tokio::test]
    async fn documents_every_route() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;

        let spec = server.get("/__docs__/spec.json").await.json::<Value>();
        let paths = spec["paths"].as_object().map(|paths| paths.len()).unwrap_or_default();
        assert!(paths >= 12, "only {paths} paths documented");
        assert!(spec["paths"]["/api/v1/notes/{note_id}/ai-images/at/{index}"]["delete"].is_object());
        assert!(spec["components"]["securitySchemes"]["bearer"].is_object());
        for schema in ["User", "Tag", "Note"] {
            let owner = if schema == "User" { "id" } else { "user_id" };
            assert_eq!(spec["components"]["schemas"][schema]["properties"][owner]["format"], "uuid");
        }

        assert_eq!(server.get("/__docs__").await.status_code(), 200);
        Ok(())
    }

    async fn test_server(db: DB) -> Result<TestServer> {
        crate::tests::test_server(db, api).await
    }
}
