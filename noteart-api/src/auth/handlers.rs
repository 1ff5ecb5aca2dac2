use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::{ctx::BaseParams, db, shared::random_token, Error, Result, DB};

use super::{CurrentUserResponse, Session, SignOutResponse, User};

impl<'a> TryFrom<&Row<'a>> for User {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            is_anonymous: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

/// Maps a session token to its user. Unknown tokens are "no identity", not an error.
pub async fn resolve_identity(db: &DB, token: String) -> Result<Option<User>> {
    db.call(move |conn| {
        let user = conn
            .query_row(
                r#"SELECT users.id, users.email, users.is_anonymous, users.created_at
                FROM sessions JOIN users ON users.id = sessions.user_id
                WHERE sessions.token = ?"#,
                params![token],
                |row| User::try_from(row),
            )
            .optional()?;
        Ok(user)
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn sign_in_anonymously(BaseParams { db, .. }: BaseParams) -> Result<Session> {
    let token = random_token();

    db.call(move |conn| {
        let tx = conn.transaction()?;
        let user = tx.query_row(
            r#"INSERT INTO users (id, is_anonymous, created_at) VALUES (?, 1, ?)
            RETURNING id, email, is_anonymous, created_at"#,
            params![Uuid::now_v7(), Utc::now()],
            |row| User::try_from(row),
        )?;
        tx.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)",
            params![token, user.id, Utc::now()],
        )?;
        tx.commit()?;

        tracing::info!(user_id = %user.id, "anonymous sign-in");

        Ok(Session { token, user })
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn current_user(BaseParams { ctx, .. }: BaseParams) -> Result<CurrentUserResponse> {
    Ok(CurrentUserResponse { user: ctx.user })
}

pub async fn sign_out(token: String, BaseParams { db, ctx }: BaseParams) -> Result<SignOutResponse> {
    let user_id = ctx.require_user_id()?;

    db.call(move |conn| {
        conn.execute(
            "DELETE FROM sessions WHERE token = ? AND user_id = ?",
            params![token, user_id],
        )?;
        Ok(SignOutResponse { success: true })
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use crate::ctx::Ctx;

    /// Signs in a fresh anonymous user directly against the database.
    pub async fn sign_in(db: &DB) -> Session {
        sign_in_anonymously(BaseParams::new(db.clone(), Ctx::new(None)))
            .await
            .unwrap()
    }
}
