use std::sync::{Arc, OnceLock};

use crate::error_responses;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Request,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::db;

pub use response::ErrorResponse;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // auth
    #[error("unauthenticated")]
    Unauthenticated,
    /// The entity is missing or belongs to someone else. Callers cannot tell which.
    #[error("not_found_or_unauthorized")]
    NotFoundOrUnauthorized(String),

    // domain
    #[error("duplicate_tag")]
    DuplicateTag(String),
    #[error("invalid_index")]
    InvalidIndex(i64),
    #[error("upload_failed")]
    UploadFailed(String),

    // image providers
    #[error("missing_configuration")]
    MissingConfiguration(&'static str),
    #[error("generation_failed")]
    GenerationFailed(String),

    // validation
    #[error("validation")]
    Validation(String),
    #[error("validation")]
    JsonValidation(#[from] JsonRejection),
    #[error("validation")]
    QueryValidation(#[from] QueryRejection),
    #[error("validation")]
    PathValidation(#[from] PathRejection),

    #[error(transparent)]
    DB(db::Error),

    // other
    #[error("unexpected")]
    Unexpected(String),
}

impl From<db::Error> for Error {
    fn from(error: db::Error) -> Self {
        match error {
            db::Error::NotFound(msg) => Self::NotFoundOrUnauthorized(msg),
            db::Error::TokioRusqlite(db::tokio_rusqlite::Error::Other(err)) => match err.downcast::<Error>() {
                Ok(error) => *error,
                Err(err) => Self::DB(db::Error::TokioRusqlite(db::tokio_rusqlite::Error::Other(err))),
            },
            error => Self::DB(error),
        }
    }
}

/// crate::Error <--> tokio_rusqlite::Error
/// ```rust
/// impl From<tokio_rusqlite::Error> for Error { }
/// impl From<Error> for tokio_rusqlite::Error { }
/// ```
pub mod db_mappers {
    use super::*;
    use crate::db::rusqlite;
    use crate::db::tokio_rusqlite;

    impl From<tokio_rusqlite::Error> for Error {
        fn from(error: tokio_rusqlite::Error) -> Self {
            Error::from(db::Error::from(error))
        }
    }

    impl From<rusqlite::Error> for Error {
        fn from(error: rusqlite::Error) -> Self {
            Error::from(db::Error::from(error))
        }
    }

    impl From<Error> for tokio_rusqlite::Error {
        fn from(error: Error) -> Self {
            tokio_rusqlite::Error::Other(error.into())
        }
    }
}

// Response

error_responses! {
    unauthenticated: 401,
    not_found_or_unauthorized: 404,
    duplicate_tag: 409,
    invalid_index: 400,
    upload_failed: 400,
    missing_configuration: 412,
    generation_failed: 502,
    validation: 400,
    path_validation: 400,
    query_validation: 400,
    json_validation: 400,
    unexpected: 500
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        let errors = errors();
        match error {
            Error::Unauthenticated => errors.unauthenticated.with_message("Not authenticated"),
            Error::NotFoundOrUnauthorized(message) => errors.not_found_or_unauthorized.with_message(message),
            Error::DuplicateTag(name) => errors
                .duplicate_tag
                .with_message(format!("Tag \"{name}\" already exists")),
            Error::InvalidIndex(index) => errors
                .invalid_index
                .with_message(format!("Invalid image index {index}")),
            Error::UploadFailed(detail) => errors
                .upload_failed
                .with_message(format!("Upload failed: {detail}")),
            Error::MissingConfiguration(name) => errors
                .missing_configuration
                .with_message(format!("{name} not configured")),
            Error::GenerationFailed(_) => errors
                .generation_failed
                .with_message("Failed to generate image. Please try again."),
            Error::Validation(message) => errors.validation.with_message(message),
            Error::JsonValidation(error) => errors.json_validation.with_message(error.body_text()),
            Error::QueryValidation(error) => errors.query_validation.with_message(error.body_text()),
            Error::PathValidation(error) => errors.path_validation.with_message(error.body_text()),
            Error::Unexpected(message) => errors.unexpected.with_message(message),
            Error::DB(_) => errors.unexpected.with_message("Unexpected"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let error = Arc::new(self);

        let error_res = ErrorResponse::from(error.as_ref());
        let status = error_res.status;

        let mut res = axum::Json(error_res).into_response();
        res.extensions_mut().insert(error);

        *res.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        res
    }
}

pub async fn on_error(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let error = response.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    if let Some(error) = error {
        match error {
            Error::DB(_) | Error::Unexpected(_) | Error::GenerationFailed(_) => tracing::error!("{:?}", error),
            _ => tracing::debug!("{:?}", error),
        }
    }

    response
}

mod response {
    use serde::Deserialize;
    use serde_json::Value;
    use utoipa::ToSchema;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, Clone, Default, ToSchema)]
    pub struct ErrorResponse {
        pub error: String,
        pub message: Option<String>,
        pub status: u16,
        pub details: Option<Value>,
    }

    impl ErrorResponse {
        pub fn new(error: impl Into<String>, status: u16) -> Self {
            Self {
                error: error.into(),
                status,
                ..Default::default()
            }
        }

        pub fn with_message(&self, message: impl Into<String>) -> Self {
            let mut res = self.clone();
            res.message = Some(message.into());
            res
        }
    }

    /// Typed responses
    /// ```rust
    /// error_responses! {
    ///     not_found: 404,
    ///     unexpected: 500
    /// }
    ///
    /// impl From<&Error> for ErrorResponse {
    ///     fn from(error: &Error) -> Self {
    ///     let errors = errors(); // <- from macro
    ///     match error {
    ///         Error::NotFound(message) => errors.not_found.with_message(message),
    ///         Error::Unexpected(message) => errors.unexpected.with_message(message),
    ///     }
    /// }
    /// ```
    #[macro_export]
    macro_rules! error_responses {
        (
            $($name:ident: $code:expr),* $(,)?
        ) => {
            #[derive(Debug, Clone, Serialize)]
            struct Responses {
                $(
                    $name: ErrorResponse,
                )*
            }

            static ERRORS: OnceLock<Responses> = OnceLock::new();

            fn errors() -> &'static Responses {
                ERRORS.get_or_init(|| Responses {
                    $(
                        $name: ErrorResponse::new(stringify!($name), $code),
                    )*
                })
            }
        };
    }
}
