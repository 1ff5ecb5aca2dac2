mod handlers;
mod model;
mod routes;

pub use handlers::{blob_url, resolve_urls};
pub use model::*;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new().merge(routes::router(state))
}
