use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::{
    ctx::BaseParams,
    db::{self, from_json, to_json},
    storage, Error, Result,
};

use super::{CreateNote, FindNotesQuery, FindNotesResponse, Note, NoteView, UpdateNote};

pub(crate) const NOTE_COLUMNS: &str =
    "id, title, description, content, tags, image_ids, image_id, ai_generated_images, user_id, created_at, updated_at";

impl<'a> TryFrom<&Row<'a>> for Note {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        let image_id: Option<Uuid> = row.get(6)?;
        let mut image_ids: Vec<Uuid> = from_json(row, 5)?;
        if image_ids.is_empty() {
            image_ids.extend(image_id);
        }

        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            content: row.get(3)?,
            tags: from_json(row, 4)?,
            image_ids,
            image_id,
            ai_generated_images: from_json(row, 7)?,
            user_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl NoteView {
    pub(crate) fn resolve(conn: &Connection, note: Note) -> Self {
        let image_urls = storage::resolve_urls(conn, &note.image_ids);
        Self { note, image_urls }
    }
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::Validation("Note content must not be empty".into()));
    }
    Ok(())
}

/// Turns free text into an FTS5 expression: every term quoted, terms OR-ed, the last one
/// prefix-matched. `None` when the text holds no searchable term.
pub(crate) fn fts_query(query: &str) -> Option<String> {
    let terms = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>();

    let (last, rest) = terms.split_last()?;
    let mut expression = rest.join(" OR ");
    if !expression.is_empty() {
        expression.push_str(" OR ");
    }
    expression.push_str(last);
    expression.push('*');
    Some(expression)
}

/// Lists when the query is blank, searches otherwise.
pub async fn find_notes(FindNotesQuery { query }: FindNotesQuery, base: BaseParams) -> Result<FindNotesResponse> {
    match query.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => search_notes(query.to_owned(), base).await,
        _ => list_notes(base).await,
    }
}

pub async fn list_notes(BaseParams { db, ctx }: BaseParams) -> Result<FindNotesResponse> {
    let Some(user_id) = ctx.get_user_id() else {
        return Ok(FindNotesResponse { results: vec![] });
    };

    db.call(move |conn| {
        let notes = conn
            .prepare(&format!(
                "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ? ORDER BY created_at DESC, rowid DESC"
            ))?
            .query_map(params![user_id], |row| Note::try_from(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let results = notes.into_iter().map(|note| NoteView::resolve(conn, note)).collect();
        Ok(FindNotesResponse { results })
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn search_notes(query: String, BaseParams { db, ctx }: BaseParams) -> Result<FindNotesResponse> {
    let Some(user_id) = ctx.get_user_id() else {
        return Ok(FindNotesResponse { results: vec![] });
    };
    let Some(expression) = fts_query(&query) else {
        return Ok(FindNotesResponse { results: vec![] });
    };

    tracing::debug!(%expression, "searching notes");

    db.call(move |conn| {
        let notes = conn
            .prepare(&format!(
                r#"SELECT {NOTE_COLUMNS} FROM notes
                JOIN (SELECT rowid AS hit, rank FROM notes_fts WHERE notes_fts MATCH ?) AS hits
                    ON notes.rowid = hits.hit
                WHERE user_id = ?
                ORDER BY hits.rank"#
            ))?
            .query_map(params![expression, user_id], |row| Note::try_from(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let results = notes.into_iter().map(|note| NoteView::resolve(conn, note)).collect();
        Ok(FindNotesResponse { results })
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn create_note(
    CreateNote {
        title,
        description,
        content,
        tags,
        image_ids,
    }: CreateNote,
    BaseParams { db, ctx }: BaseParams,
) -> Result<NoteView> {
    let user_id = ctx.require_user_id()?;
    validate_content(&content)?;

    db.call(move |conn| {
        let note = conn.query_row(
            &format!(
                r#"INSERT INTO notes (id, title, description, content, tags, image_ids, ai_generated_images, user_id, created_at)
                VALUES (?, ?, ?, ?, ?, ?, '[]', ?, ?)
                RETURNING {NOTE_COLUMNS}"#
            ),
            params![
                Uuid::now_v7(),
                title,
                description.unwrap_or_default(),
                content,
                to_json(&tags)?,
                to_json(&image_ids.unwrap_or_default())?,
                user_id,
                Utc::now(),
            ],
            |row| Note::try_from(row),
        )?;

        tracing::info!(note_id = %note.id, %user_id, "note created");

        Ok(NoteView::resolve(conn, note))
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn get_note(note_id: Uuid, BaseParams { db, ctx }: BaseParams) -> Result<NoteView> {
    let Some(user_id) = ctx.get_user_id() else {
        return Err(Error::NotFoundOrUnauthorized("Note not found".into()));
    };

    db.call(move |conn| {
        let note = conn.query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ? AND user_id = ?"),
            params![note_id, user_id],
            |row| Note::try_from(row),
        )?;
        Ok(NoteView::resolve(conn, note))
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| db::Error::not_found_message(e, "Note not found"))
    .map_err(Error::from)
}

/// Full replacement. The legacy `image_id` is cleared since `image_ids` is now authoritative.
pub async fn update_note(
    note_id: Uuid,
    UpdateNote {
        title,
        description,
        content,
        tags,
        image_ids,
    }: UpdateNote,
    BaseParams { db, ctx }: BaseParams,
) -> Result<NoteView> {
    let user_id = ctx.require_user_id()?;
    validate_content(&content)?;

    db.call(move |conn| {
        let note = conn.query_row(
            &format!(
                r#"UPDATE notes
                SET title = ?, description = ?, content = ?, tags = ?, image_ids = ?, image_id = NULL, updated_at = ?
                WHERE id = ? AND user_id = ?
                RETURNING {NOTE_COLUMNS}"#
            ),
            params![
                title,
                description.unwrap_or_default(),
                content,
                to_json(&tags)?,
                to_json(&image_ids.unwrap_or_default())?,
                Utc::now(),
                note_id,
                user_id,
            ],
            |row| Note::try_from(row),
        )?;
        Ok(NoteView::resolve(conn, note))
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| db::Error::not_found_message(e, "Note not found"))
    .map_err(Error::from)
}

/// Referenced blobs stay in storage.
pub async fn remove_note(note_id: Uuid, BaseParams { db, ctx }: BaseParams) -> Result<Note> {
    let user_id = ctx.require_user_id()?;

    db.call(move |conn| {
        conn.query_row(
            &format!("DELETE FROM notes WHERE id = ? AND user_id = ? RETURNING {NOTE_COLUMNS}"),
            params![note_id, user_id],
            |row| Note::try_from(row),
        )
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| db::Error::not_found_message(e, "Note not found"))
    .map_err(Error::from)
}
