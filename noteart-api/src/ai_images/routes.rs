use axum::http::StatusCode;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    ctx::BaseParams,
    errors::ErrorResponse,
    extract::{Json, Path},
    notes::NoteIdPath,
    state::AppState,
    Result,
};

use super::{handlers, AddAiImage, AddAiImageResponse, ListAiImagesResponse, RemoveAiImageResponse};

const TAG: &str = "ai-images";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
struct AiImagePath {
    note_id: Uuid,
    image_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
struct AiImageIndexPath {
    note_id: Uuid,
    /// Zero-based position in the note's image list.
    index: i64,
}

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_ai_images, add_ai_image))
        .routes(routes!(remove_ai_image_by_id))
        .routes(routes!(remove_ai_image))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/notes/{note_id}/ai-images",
    tag = TAG,
    params(NoteIdPath),
    responses((status = 200, body = ListAiImagesResponse)),
    security((), ("bearer" = []))
)]
async fn list_ai_images(
    Path(NoteIdPath { note_id }): Path<NoteIdPath>,
    base: BaseParams,
) -> Result<Json<ListAiImagesResponse>> {
    handlers::list_ai_images(note_id, base).await.map(Json)
}

/// Saves a generated image on the note. Generation itself happens in `/api/v1/images`.
#[utoipa::path(
    post,
    path = "/api/v1/notes/{note_id}/ai-images",
    tag = TAG,
    params(NoteIdPath),
    request_body = AddAiImage,
    responses(
        (status = 201, body = AddAiImageResponse),
        (status = 401, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn add_ai_image(
    Path(NoteIdPath { note_id }): Path<NoteIdPath>,
    base: BaseParams,
    Json(args): Json<AddAiImage>,
) -> Result<(StatusCode, Json<AddAiImageResponse>)> {
    handlers::add_ai_image(note_id, args, base)
        .await
        .map(|r| (StatusCode::CREATED, Json(r)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notes/{note_id}/ai-images/{image_id}",
    tag = TAG,
    params(AiImagePath),
    responses((status = 200, body = RemoveAiImageResponse), (status = 404, body = ErrorResponse)),
    security(("bearer" = []))
)]
async fn remove_ai_image_by_id(
    Path(AiImagePath { note_id, image_id }): Path<AiImagePath>,
    base: BaseParams,
) -> Result<Json<RemoveAiImageResponse>> {
    handlers::remove_ai_image_by_id(note_id, image_id, base).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/api/v1/notes/{note_id}/ai-images/at/{index}",
    tag = TAG,
    params(AiImageIndexPath),
    responses(
        (status = 200, body = RemoveAiImageResponse),
        (status = 400, description = "Index out of range", body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
async fn remove_ai_image(
    Path(AiImageIndexPath { note_id, index }): Path<AiImageIndexPath>,
    base: BaseParams,
) -> Result<Json<RemoveAiImageResponse>> {
    handlers::remove_ai_image(note_id, index, base).await.map(Json)
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        ai_images::{AddAiImageResponse, ListAiImagesResponse},
        db::{init_test_db, DB},
        errors::{ErrorResponse, Result},
        generation::ImageProvider,
        notes::NoteView,
        tests::sign_in,
    };

    async fn create_note(server: &TestServer, token: &str) -> NoteView {
        server
            .post("/api/v1/notes")
            .authorization_bearer(token)
            .json(&json!({ "title": "Trip", "content": "Beach" }))
            .await
            .json::<NoteView>()
    }

    #[tokio::test]
    async fn attach_list_and_remove() -> Result<()> {
        let db = init_test_db().await?;
        let (_, token) = sign_in(&db).await;
        let server = test_server(db).await?;
        let note = create_note(&server, &token).await;
        let images = format!("/api/v1/notes/{}/ai-images", note.note.id);

        let mut added = vec![];
        for prompt in ["sunrise", "dunes", "sunset"] {
            let response = server
                .post(&images)
                .authorization_bearer(&token)
                .json(&json!({
                    "image_url": format!("https://images.test/{prompt}.png"),
                    "prompt": prompt,
                    "provider": "imagen",
                    "metadata": { "size": "512x512" }
                }))
                .await;
            assert_eq!(response.status_code(), 201);
            added.push(response.json::<AddAiImageResponse>());
        }
        assert_eq!(added[2].index, 2);
        assert_eq!(added[2].ai_image.provider, ImageProvider::Imagen);

        let response = server
            .delete(&format!("{images}/at/1"))
            .authorization_bearer(&token)
            .await;
        assert_eq!(response.status_code(), 200);

        let response = server
            .delete(&format!("{images}/{}", added[0].image_id))
            .authorization_bearer(&token)
            .await;
        assert_eq!(response.status_code(), 200);

        let remaining = server
            .get(&images)
            .authorization_bearer(&token)
            .await
            .json::<ListAiImagesResponse>()
            .results;
        assert_eq!(remaining, vec![added[2].ai_image.clone()]);

        let view = server
            .get(&format!("/api/v1/notes/{}", note.note.id))
            .authorization_bearer(&token)
            .await
            .json::<NoteView>();
        assert_eq!(view.note.ai_generated_images, remaining);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_index_is_a_client_error() -> Result<()> {
        let db = init_test_db().await?;
        let (_, token) = sign_in(&db).await;
        let server = test_server(db).await?;
        let note = create_note(&server, &token).await;

        let response = server
            .delete(&format!("/api/v1/notes/{}/ai-images/at/-1", note.note.id))
            .authorization_bearer(&token)
            .await;

        assert_eq!(response.status_code(), 400);
        let error = response.json::<ErrorResponse>();
        assert_eq!(error.error, "invalid_index");
        assert_eq!(error.message.as_deref(), Some("Invalid image index -1"));
        Ok(())
    }

    #[tokio::test]
    async fn listing_foreign_notes_is_empty() -> Result<()> {
        let db = init_test_db().await?;
        let (_, alice) = sign_in(&db).await;
        let (_, bob) = sign_in(&db).await;
        let server = test_server(db).await?;
        let note = create_note(&server, &alice).await;

        let response = server
            .get(&format!("/api/v1/notes/{}/ai-images", note.note.id))
            .authorization_bearer(&bob)
            .await;

        assert_eq!(response.status_code(), 200);
        assert!(response.json::<ListAiImagesResponse>().results.is_empty());
        Ok(())
    }

    async fn test_server(db: DB) -> Result<TestServer> {
        crate::tests::test_server(db, |state| {
            super::router(state.clone()).merge(crate::notes::router(state))
        })
        .await
    }
}
