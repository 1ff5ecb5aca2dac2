mod config;

mod ai_images;
mod app;
mod auth;
mod ctx;
mod db;
mod errors;
mod extract;
mod generation;
mod notes;
mod openapi;
mod shared;
mod state;
mod storage;
mod tags;

use std::net::SocketAddr;

use app::AppParams;
pub use config::config;
pub use db::{init_db, DB};
pub use errors::{Error, Result};
use generation::{GatewayConfig, ImageGateway};
use shared::tracing::{add_tracing_layer, setup_tracing};
use state::AppState;
use tokio::net::TcpListener;
use utoipa_axum::router::OpenApiRouter;

pub fn api_router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .merge(auth::router(state.clone()))
        .merge(tags::router(state.clone()))
        .merge(notes::router(state.clone()))
        .merge(ai_images::router(state.clone()))
        .merge(storage::router(state.clone()))
        .merge(generation::router(state))
}

#[tokio::main]
async fn main() -> errors::Result<()> {
    let config = config();

    setup_tracing(config);

    let conn = init_db().await?;
    let images = ImageGateway::new(GatewayConfig::from(config))?;

    let (app, _) = app::create(AppParams {
        db: conn,
        images,
        router: api_router,
    })
    .await?;

    let app = add_tracing_layer(app);

    let port = config.port;
    let listener = TcpListener::bind(format!("127.0.0.1:{port}"))
        .await
        .map_err(|e| Error::Unexpected(format!("failed to bind port {port}: {e}")))?;

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("listening on http://{addr}");
    }

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| Error::Unexpected(e.to_string()))?;

    Ok(())
}
