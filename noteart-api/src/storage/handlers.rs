use axum::body::Bytes;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::{auth::UserId, config, ctx::BaseParams, db, shared::random_token, Error, Result, DB};

use super::{Blob, UploadResponse, UploadUrlResponse};

pub(super) const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

impl Blob {
    /// Raster images render inline. Everything else, SVG included, is sent as a download.
    pub fn is_inline(&self) -> bool {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence.starts_with("image/") && essence != "image/svg+xml"
    }
}

pub fn blob_url(storage_id: Uuid) -> String {
    format!("{}/api/v1/storage/{storage_id}", config().public_url.trim_end_matches('/'))
}

/// Public URL of a stored blob, `None` when nothing is stored under that id.
pub fn resolve_url(conn: &Connection, storage_id: Uuid) -> rusqlite::Result<Option<String>> {
    let found = conn
        .query_row("SELECT 1 FROM blobs WHERE id = ?", params![storage_id], |_| Ok(()))
        .optional()?;
    Ok(found.map(|_| blob_url(storage_id)))
}

/// Resolves each reference on its own; a failing lookup yields `None` for that slot only.
pub fn resolve_urls(conn: &Connection, storage_ids: &[Uuid]) -> Vec<Option<String>> {
    storage_ids
        .iter()
        .map(|&storage_id| {
            resolve_url(conn, storage_id).unwrap_or_else(|error| {
                tracing::warn!(%storage_id, %error, "could not resolve blob url");
                None
            })
        })
        .collect()
}

pub async fn generate_upload_url(BaseParams { db, ctx }: BaseParams) -> Result<UploadUrlResponse> {
    let user_id = ctx.require_user_id()?;
    let token = random_token();
    let expires_at = Utc::now() + Duration::seconds(config().upload_url_ttl_secs);

    db.call(move |conn| {
        conn.execute(
            "INSERT INTO upload_targets (token, user_id, expires_at) VALUES (?, ?, ?)",
            params![token, user_id, expires_at],
        )?;

        let upload_url = format!(
            "{}/api/v1/storage/upload/{token}",
            config().public_url.trim_end_matches('/')
        );
        Ok(UploadUrlResponse { upload_url })
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

/// Consumes the upload target and stores the body. Targets are single use, even when expired.
pub async fn upload(token: String, content_type: Option<String>, body: Bytes, db: DB) -> Result<UploadResponse> {
    if body.is_empty() {
        return Err(Error::UploadFailed("empty body".into()));
    }
    let content_type = content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.into());

    db.call(move |conn| {
        let tx = conn.transaction()?;

        let target = tx
            .query_row(
                "DELETE FROM upload_targets WHERE token = ? RETURNING user_id, expires_at",
                params![token],
                |row| Ok((row.get::<_, UserId>(0)?, row.get::<_, DateTime<Utc>>(1)?)),
            )
            .optional()?;

        let Some((user_id, expires_at)) = target else {
            return Err(Error::UploadFailed("unknown upload url".into()).into());
        };
        if expires_at < Utc::now() {
            tx.commit()?;
            return Err(Error::UploadFailed("upload url expired".into()).into());
        }

        let storage_id = Uuid::now_v7();
        tx.execute(
            "INSERT INTO blobs (id, content_type, size, data, uploaded_by, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![storage_id, content_type, body.len() as i64, body.as_ref(), user_id, Utc::now()],
        )?;
        tx.commit()?;

        tracing::info!(%storage_id, %user_id, size = body.len(), "blob stored");

        Ok(UploadResponse { storage_id })
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn get_blob(storage_id: Uuid, db: DB) -> Result<Blob> {
    db.call(move |conn| {
        conn.query_row(
            "SELECT content_type, data FROM blobs WHERE id = ?",
            params![storage_id],
            |row| {
                Ok(Blob {
                    content_type: row.get(0)?,
                    data: row.get(1)?,
                })
            },
        )
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| db::Error::not_found_message(e, "File not found"))
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::handlers::fixtures::sign_in, ctx::Ctx, db::init_test_db};

    fn token_of(upload_url: &str) -> String {
        upload_url.rsplit('/').next().unwrap_or_default().to_owned()
    }

    #[tokio::test]
    async fn upload_targets_are_single_use() -> Result<()> {
        let db = init_test_db().await?;
        let session = sign_in(&db).await;
        let base = BaseParams::new(db.clone(), Ctx::new(Some(session.user)));

        let token = token_of(&generate_upload_url(base).await?.upload_url);

        let stored = upload(token.clone(), Some("image/png".into()), Bytes::from_static(b"png"), db.clone()).await?;
        let blob = get_blob(stored.storage_id, db.clone()).await?;
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(blob.data, b"png");

        let again = upload(token, None, Bytes::from_static(b"png"), db).await;
        assert!(matches!(again, Err(Error::UploadFailed(_))));
        Ok(())
    }

    #[tokio::test]
    async fn expired_targets_are_rejected() -> Result<()> {
        let db = init_test_db().await?;
        let session = sign_in(&db).await;
        let user_id = session.user.id;

        db.call(move |conn| {
            conn.execute(
                "INSERT INTO upload_targets (token, user_id, expires_at) VALUES ('old', ?, ?)",
                params![user_id, Utc::now() - Duration::minutes(1)],
            )?;
            Ok(())
        })
        .await?;

        let result = upload("old".into(), None, Bytes::from_static(b"data"), db).await;
        assert!(matches!(result, Err(Error::UploadFailed(detail)) if detail == "upload url expired"));
        Ok(())
    }

    #[test]
    fn only_raster_images_render_inline() {
        let blob = |content_type: &str| Blob {
            content_type: content_type.into(),
            data: vec![],
        };

        assert!(blob("image/png").is_inline());
        assert!(blob("Image/JPEG; q=1").is_inline());
        assert!(!blob("image/svg+xml").is_inline());
        assert!(!blob("text/html").is_inline());
        assert!(!blob(DEFAULT_CONTENT_TYPE).is_inline());
    }

    #[tokio::test]
    async fn empty_uploads_fail() -> Result<()> {
        let db = init_test_db().await?;

        let result = upload("any".into(), None, Bytes::new(), db).await;
        assert!(matches!(result, Err(Error::UploadFailed(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unresolvable_references_become_none_in_place() -> Result<()> {
        let db = init_test_db().await?;
        let session = sign_in(&db).await;
        let base = BaseParams::new(db.clone(), Ctx::new(Some(session.user)));

        let token = token_of(&generate_upload_url(base).await?.upload_url);
        let stored = upload(token, None, Bytes::from_static(b"a"), db.clone()).await?.storage_id;
        let missing = Uuid::now_v7();

        let urls = db
            .call(move |conn| Ok(resolve_urls(conn, &[missing, stored, missing])))
            .await?;

        assert_eq!(urls, vec![None, Some(blob_url(stored)), None]);
        assert!(urls[1].as_deref().is_some_and(|url| url.ends_with(&format!("/api/v1/storage/{stored}"))));
        Ok(())
    }
}
