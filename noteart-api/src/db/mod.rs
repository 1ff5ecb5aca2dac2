mod migrations;

use rusqlite::{functions::FunctionFlags, Row};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::config::config;

pub use migrations::MIGRATIONS;
pub use rusqlite;
pub use tokio_rusqlite;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not_found")]
    NotFound(String),
    #[error(transparent)]
    TokioRusqlite(tokio_rusqlite::Error),
    #[error(transparent)]
    Rusqlite(rusqlite::Error),
}

impl Error {
    pub fn not_found_message(self, message: impl Into<String>) -> Self {
        if matches!(self, Self::NotFound(_)) {
            return Self::NotFound(message.into());
        }
        self
    }
}

impl From<tokio_rusqlite::Error> for Error {
    fn from(error: tokio_rusqlite::Error) -> Self {
        match error {
            tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows) => Self::NotFound("Not found".into()),
            error => Self::TokioRusqlite(error),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound("Not found".into()),
            error => Self::Rusqlite(error),
        }
    }
}

pub type DB = tokio_rusqlite::Connection;

pub async fn init_db() -> Result<DB> {
    let conn = tokio_rusqlite::Connection::open(&config().database_url).await?;

    conn.call(|conn| {
        add_uuid_functions(conn)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        MIGRATIONS
            .to_latest(conn)
            .map_err(|e| tokio_rusqlite::Error::Other(e.into()))?;

        Ok(())
    })
    .await?;

    tracing::info!("database ready at {}", config().database_url);

    Ok(conn)
}

#[cfg(test)]
pub async fn init_test_db() -> Result<DB> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;

    conn.call(|conn| {
        add_uuid_functions(conn)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        MIGRATIONS
            .to_latest(conn)
            .map_err(|e| tokio_rusqlite::Error::Other(e.into()))?;

        Ok(())
    })
    .await?;

    Ok(conn)
}

fn add_uuid_functions(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function("uuid7_now", 0, FunctionFlags::SQLITE_UTF8, |_| Ok(Uuid::now_v7()))?;

    conn.create_scalar_function("uuid_blob", 1, FunctionFlags::SQLITE_UTF8, |ctx| {
        let value = ctx.get::<String>(0)?;
        let uuid = Uuid::parse_str(&value).map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;

        Ok(uuid)
    })?;

    Ok(())
}

/// Serializes a value for a JSON `TEXT` column.
pub fn to_json<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Reads a JSON `TEXT` column. `NULL` (rows written before the column existed) reads as the default.
pub fn from_json<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: DeserializeOwned + Default,
{
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))),
        None => Ok(T::default()),
    }
}
