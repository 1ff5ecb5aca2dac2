use chrono::Utc;
use rusqlite::{ffi, params, Row};
use uuid::Uuid;

use crate::{
    ctx::BaseParams,
    db::{self, tokio_rusqlite},
    Error, Result,
};

use super::{CreateTag, ListTagsResponse, Tag, UpdateTag};

const TAG_COLUMNS: &str = "id, name, color, user_id, created_at";

impl<'a> TryFrom<&Row<'a>> for Tag {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            user_id: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

/// Names are stored verbatim so they keep matching the tag strings held by notes.
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("Tag name must not be empty".into()));
    }
    Ok(())
}

/// `(user_id, name)` is backed by a unique index; a violation there means a duplicate name.
fn map_unique_violation(error: rusqlite::Error, name: &str) -> tokio_rusqlite::Error {
    match error {
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            Error::DuplicateTag(name.to_owned()).into()
        }
        error => error.into(),
    }
}

pub async fn list_tags(BaseParams { db, ctx }: BaseParams) -> Result<ListTagsResponse> {
    let Some(user_id) = ctx.get_user_id() else {
        return Ok(ListTagsResponse { results: vec![] });
    };

    db.call(move |conn| {
        let tags = conn
            .prepare(&format!(
                "SELECT {TAG_COLUMNS} FROM tags WHERE user_id = ? ORDER BY rowid"
            ))?
            .query_map(params![user_id], |row| Tag::try_from(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ListTagsResponse { results: tags })
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn create_tag(CreateTag { name, color }: CreateTag, BaseParams { db, ctx }: BaseParams) -> Result<Tag> {
    let user_id = ctx.require_user_id()?;
    validate_name(&name)?;

    db.call(move |conn| {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE user_id = ? AND name = ?)",
            params![user_id, name],
            |row| row.get(0),
        )?;
        if exists {
            return Err(Error::DuplicateTag(name).into());
        }

        conn.query_row(
            &format!(
                "INSERT INTO tags (id, name, color, user_id, created_at) VALUES (?, ?, ?, ?, ?)
                RETURNING {TAG_COLUMNS}"
            ),
            params![Uuid::now_v7(), name, color, user_id, Utc::now()],
            |row| Tag::try_from(row),
        )
        .map_err(|e| map_unique_violation(e, &name))
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn update_tag(
    tag_id: Uuid,
    UpdateTag { name, color }: UpdateTag,
    BaseParams { db, ctx }: BaseParams,
) -> Result<Tag> {
    let user_id = ctx.require_user_id()?;
    validate_name(&name)?;

    db.call(move |conn| {
        conn.query_row(
            &format!(
                "UPDATE tags SET name = ?, color = ? WHERE id = ? AND user_id = ?
                RETURNING {TAG_COLUMNS}"
            ),
            params![name, color, tag_id, user_id],
            |row| Tag::try_from(row),
        )
        .map_err(|e| map_unique_violation(e, &name))
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| db::Error::not_found_message(e, "Tag not found"))
    .map_err(Error::from)
}

pub async fn remove_tag(tag_id: Uuid, BaseParams { db, ctx }: BaseParams) -> Result<Tag> {
    let user_id = ctx.require_user_id()?;

    db.call(move |conn| {
        conn.query_row(
            &format!("DELETE FROM tags WHERE id = ? AND user_id = ? RETURNING {TAG_COLUMNS}"),
            params![tag_id, user_id],
            |row| Tag::try_from(row),
        )
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| db::Error::not_found_message(e, "Tag not found"))
    .map_err(Error::from)
}
