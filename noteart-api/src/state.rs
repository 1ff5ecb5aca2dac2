use axum::extract::FromRef;

use crate::{db::DB, generation::ImageGateway};

#[derive(FromRef, Clone)]
pub struct AppState {
    pub conn: DB,
    pub images: ImageGateway,
}
