pub(crate) mod handlers;
mod model;
mod routes;

pub use model::*;
pub(crate) use routes::NoteIdPath;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new().merge(routes::router(state))
}
