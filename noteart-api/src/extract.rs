use axum::response::IntoResponse;
use axum_macros::{FromRequest, FromRequestParts};
use serde::Serialize;

/// `axum::Json` with rejections reported as [`crate::Error`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(crate::Error))]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(crate::Error))]
pub struct Query<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(crate::Error))]
pub struct Path<T>(pub T);
