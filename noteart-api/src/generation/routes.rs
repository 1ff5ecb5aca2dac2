use axum::extract::State;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{ctx::BaseParams, errors::ErrorResponse, extract::Json, state::AppState, Result};

use super::{EditImage, GenerateImage, GeneratedImage, ImageGateway};

const TAG: &str = "images";

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(generate_image))
        .routes(routes!(edit_image))
        .with_state(state)
}

/// Generates an image without attaching it anywhere.
#[utoipa::path(
    post,
    path = "/api/v1/images/generate",
    tag = TAG,
    request_body = GenerateImage,
    responses(
        (status = 200, body = GeneratedImage),
        (status = 401, body = ErrorResponse),
        (status = 412, description = "Provider credentials missing", body = ErrorResponse),
        (status = 502, body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn generate_image(
    State(images): State<ImageGateway>,
    BaseParams { ctx, .. }: BaseParams,
    Json(request): Json<GenerateImage>,
) -> Result<Json<GeneratedImage>> {
    let user_id = ctx.require_user_id()?;
    tracing::info!(%user_id, provider = %request.provider, "image generation requested");

    images.generate(request).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/api/v1/images/edit",
    tag = TAG,
    request_body = EditImage,
    responses(
        (status = 200, body = GeneratedImage),
        (status = 401, body = ErrorResponse),
        (status = 412, body = ErrorResponse),
        (status = 502, body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn edit_image(
    State(images): State<ImageGateway>,
    BaseParams { ctx, .. }: BaseParams,
    Json(request): Json<EditImage>,
) -> Result<Json<GeneratedImage>> {
    ctx.require_user_id()?;

    images.edit(request).await.map(Json)
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::{
        db::{init_test_db, DB},
        errors::{ErrorResponse, Result},
        generation::{fixtures, GatewayConfig, GeneratedImage, ImageGateway, ImageProvider},
        tests::sign_in,
    };

    #[tokio::test]
    async fn generate_requires_identity() -> Result<()> {
        let server = MockServer::start().await;
        let db = init_test_db().await?;
        let app = test_server(db, fixtures::config(&server)).await?;

        let response = app
            .post("/api/v1/images/generate")
            .json(&json!({ "prompt": "a fox", "provider": "openai" }))
            .await;

        assert_eq!(response.status_code(), 401);
        Ok(())
    }

    #[tokio::test]
    async fn generate_through_the_selected_provider() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "url": "https://images.test/fox.png" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let db = init_test_db().await?;
        let (_, token) = sign_in(&db).await;
        let app = test_server(db, fixtures::config(&server)).await?;

        let response = app
            .post("/api/v1/images/generate")
            .authorization_bearer(&token)
            .json(&json!({ "prompt": "a fox", "provider": "openai" }))
            .await;

        assert_eq!(response.status_code(), 200);
        let image = response.json::<GeneratedImage>();
        assert_eq!(image.provider, ImageProvider::OpenAi);
        assert_eq!(image.image_url.as_deref(), Some("https://images.test/fox.png"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_credentials_are_reported() -> Result<()> {
        let server = MockServer::start().await;
        let db = init_test_db().await?;
        let (_, token) = sign_in(&db).await;

        let mut config = fixtures::config(&server);
        config.openrouter_api_key = None;
        let app = test_server(db, config).await?;

        let response = app
            .post("/api/v1/images/generate")
            .authorization_bearer(&token)
            .json(&json!({ "prompt": "a fox", "provider": "openrouter" }))
            .await;

        assert_eq!(response.status_code(), 412);
        assert_eq!(
            response.json::<ErrorResponse>().message.as_deref(),
            Some("OPENROUTER_API_KEY not configured")
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_generations_are_bad_gateway() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let db = init_test_db().await?;
        let (_, token) = sign_in(&db).await;
        let app = test_server(db, fixtures::config(&server)).await?;

        let response = app
            .post("/api/v1/images/edit")
            .authorization_bearer(&token)
            .json(&json!({ "prompt": "at night", "image_url": "https://images.test/fox.png" }))
            .await;

        assert_eq!(response.status_code(), 502);
        assert_eq!(
            response.json::<ErrorResponse>().message.as_deref(),
            Some("Failed to generate image. Please try again.")
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_providers_are_rejected() -> Result<()> {
        let server = MockServer::start().await;
        let db = init_test_db().await?;
        let (_, token) = sign_in(&db).await;
        let app = test_server(db, fixtures::config(&server)).await?;

        let response = app
            .post("/api/v1/images/generate")
            .authorization_bearer(&token)
            .json(&json!({ "prompt": "a fox", "provider": "midjourney" }))
            .await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(response.json::<ErrorResponse>().error, "json_validation");
        Ok(())
    }

    async fn test_server(db: DB, config: GatewayConfig) -> Result<TestServer> {
        crate::tests::test_server_with_images(db, ImageGateway::new(config)?, super::router).await
    }
}
