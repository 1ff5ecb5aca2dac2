use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::{
    auth::UserId,
    ctx::BaseParams,
    db::{self, from_json, to_json, tokio_rusqlite},
    Error, Result,
};

use super::{AddAiImage, AddAiImageResponse, AiImage, ListAiImagesResponse, RemoveAiImageResponse};

fn load_images(conn: &Connection, note_id: Uuid, user_id: UserId) -> rusqlite::Result<Vec<AiImage>> {
    conn.query_row(
        "SELECT ai_generated_images FROM notes WHERE id = ? AND user_id = ?",
        params![note_id, user_id],
        |row| from_json(row, 0),
    )
}

fn store_images(conn: &Connection, note_id: Uuid, images: &[AiImage]) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE notes SET ai_generated_images = ?, updated_at = ? WHERE id = ?",
        params![to_json(&images)?, Utc::now(), note_id],
    )?;
    Ok(())
}

/// Read-modify-write of a note's image list inside one transaction.
async fn modify_images<T, F>(note_id: Uuid, BaseParams { db, ctx }: BaseParams, modify: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Vec<AiImage>) -> Result<T> + Send + 'static,
{
    let user_id = ctx.require_user_id()?;

    db.call(move |conn| {
        let tx = conn.transaction()?;

        let mut images = load_images(&tx, note_id, user_id)?;
        let result = modify(&mut images).map_err(tokio_rusqlite::Error::from)?;
        store_images(&tx, note_id, &images)?;

        tx.commit()?;
        Ok(result)
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| db::Error::not_found_message(e, "Note not found"))
    .map_err(Error::from)
}

pub async fn add_ai_image(
    note_id: Uuid,
    AddAiImage {
        image_url,
        prompt,
        provider,
        metadata,
    }: AddAiImage,
    base: BaseParams,
) -> Result<AddAiImageResponse> {
    if image_url.trim().is_empty() {
        return Err(Error::Validation("Image URL must not be empty".into()));
    }

    let ai_image = AiImage {
        id: Uuid::now_v7(),
        url: image_url,
        prompt,
        generated_at: Utc::now(),
        provider,
        metadata,
    };

    let response = modify_images(note_id, base, move |images| {
        images.push(ai_image.clone());
        Ok(AddAiImageResponse {
            success: true,
            image_id: ai_image.id,
            index: images.len() - 1,
            ai_image,
        })
    })
    .await?;

    tracing::info!(%note_id, image_id = %response.image_id, "ai image attached");

    Ok(response)
}

/// Positional removal. Indexes shift after every removal, prefer [`remove_ai_image_by_id`].
pub async fn remove_ai_image(note_id: Uuid, index: i64, base: BaseParams) -> Result<RemoveAiImageResponse> {
    modify_images(note_id, base, move |images| {
        let position = usize::try_from(index)
            .ok()
            .filter(|&position| position < images.len())
            .ok_or(Error::InvalidIndex(index))?;

        Ok(RemoveAiImageResponse {
            success: true,
            removed: images.remove(position),
        })
    })
    .await
}

pub async fn remove_ai_image_by_id(note_id: Uuid, image_id: Uuid, base: BaseParams) -> Result<RemoveAiImageResponse> {
    modify_images(note_id, base, move |images| {
        let position = images
            .iter()
            .position(|image| image.id == image_id)
            .ok_or_else(|| Error::NotFoundOrUnauthorized("Image not found".into()))?;

        Ok(RemoveAiImageResponse {
            success: true,
            removed: images.remove(position),
        })
    })
    .await
}

/// Empty for anonymous callers, foreign notes and missing notes alike.
pub async fn list_ai_images(note_id: Uuid, BaseParams { db, ctx }: BaseParams) -> Result<ListAiImagesResponse> {
    let Some(user_id) = ctx.get_user_id() else {
        return Ok(ListAiImagesResponse { results: vec![] });
    };

    db.call(move |conn| {
        let results = load_images(conn, note_id, user_id).optional()?.unwrap_or_default();
        Ok(ListAiImagesResponse { results })
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::handlers::fixtures::sign_in,
        ctx::Ctx,
        db::init_test_db,
        generation::ImageProvider,
        notes::{handlers::create_note, CreateNote},
        DB,
    };

    async fn as_new_user(db: &DB) -> BaseParams {
        let session = sign_in(db).await;
        BaseParams::new(db.clone(), Ctx::new(Some(session.user)))
    }

    async fn new_note(base: &BaseParams) -> Result<Uuid> {
        let note = CreateNote {
            title: "Trip".into(),
            description: None,
            content: "Beach".into(),
            tags: vec![],
            image_ids: None,
        };
        Ok(create_note(note, base.clone()).await?.note.id)
    }

    fn image(prompt: &str) -> AddAiImage {
        AddAiImage {
            image_url: format!("https://images.test/{prompt}.png"),
            prompt: prompt.into(),
            provider: ImageProvider::OpenAi,
            metadata: None,
        }
    }

    fn prompts(images: &[AiImage]) -> Vec<&str> {
        images.iter().map(|image| image.prompt.as_str()).collect()
    }

    #[tokio::test]
    async fn removing_by_index_keeps_the_rest_in_order() -> Result<()> {
        let db = init_test_db().await?;
        let base = as_new_user(&db).await;
        let note_id = new_note(&base).await?;

        for (expected, prompt) in ["a", "b", "c"].into_iter().enumerate() {
            let added = add_ai_image(note_id, image(prompt), base.clone()).await?;
            assert_eq!(added.index, expected);
        }

        let removed = remove_ai_image(note_id, 1, base.clone()).await?;
        assert_eq!(removed.removed.prompt, "b");

        let images = list_ai_images(note_id, base).await?.results;
        assert_eq!(prompts(&images), vec!["a", "c"]);
        Ok(())
    }

    #[tokio::test]
    async fn out_of_range_indexes_are_invalid() -> Result<()> {
        let db = init_test_db().await?;
        let base = as_new_user(&db).await;
        let note_id = new_note(&base).await?;
        add_ai_image(note_id, image("a"), base.clone()).await?;

        for index in [-1, 1, 99] {
            let result = remove_ai_image(note_id, index, base.clone()).await;
            assert!(matches!(result, Err(Error::InvalidIndex(i)) if i == index));
        }

        assert_eq!(list_ai_images(note_id, base).await?.results.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn removing_by_id_is_stable() -> Result<()> {
        let db = init_test_db().await?;
        let base = as_new_user(&db).await;
        let note_id = new_note(&base).await?;

        let a = add_ai_image(note_id, image("a"), base.clone()).await?.image_id;
        let b = add_ai_image(note_id, image("b"), base.clone()).await?.image_id;

        remove_ai_image_by_id(note_id, a, base.clone()).await?;
        let removed = remove_ai_image_by_id(note_id, b, base.clone()).await?;
        assert_eq!(removed.removed.prompt, "b");

        let again = remove_ai_image_by_id(note_id, b, base.clone()).await;
        assert!(matches!(again, Err(Error::NotFoundOrUnauthorized(_))));
        assert!(list_ai_images(note_id, base).await?.results.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn duplicates_are_kept() -> Result<()> {
        let db = init_test_db().await?;
        let base = as_new_user(&db).await;
        let note_id = new_note(&base).await?;

        add_ai_image(note_id, image("a"), base.clone()).await?;
        add_ai_image(note_id, image("a"), base.clone()).await?;

        assert_eq!(prompts(&list_ai_images(note_id, base).await?.results), vec!["a", "a"]);
        Ok(())
    }

    #[tokio::test]
    async fn foreign_notes_are_invisible() -> Result<()> {
        let db = init_test_db().await?;
        let alice = as_new_user(&db).await;
        let bob = as_new_user(&db).await;
        let note_id = new_note(&alice).await?;
        add_ai_image(note_id, image("a"), alice.clone()).await?;

        assert!(list_ai_images(note_id, bob.clone()).await?.results.is_empty());
        assert!(matches!(
            add_ai_image(note_id, image("b"), bob.clone()).await,
            Err(Error::NotFoundOrUnauthorized(_))
        ));
        assert!(matches!(
            remove_ai_image(note_id, 0, bob).await,
            Err(Error::NotFoundOrUnauthorized(_))
        ));

        let anonymous = BaseParams::new(db, Ctx::new(None));
        assert!(list_ai_images(note_id, anonymous.clone()).await?.results.is_empty());
        assert!(matches!(
            add_ai_image(note_id, image("c"), anonymous).await,
            Err(Error::Unauthenticated)
        ));

        assert_eq!(list_ai_images(note_id, alice).await?.results.len(), 1);
        Ok(())
    }
}
