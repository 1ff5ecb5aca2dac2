use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace,
    trace::TraceLayer,
};
use tracing_subscriber::prelude::*;

use crate::config::Config;

pub fn setup_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "noteart_api=debug,tower_http=debug,axum::rejection=trace".into());

    let console = config
        .tokio_console
        .then(console_subscriber::spawn::<tracing_subscriber::Registry>);

    let tracing = tracing_subscriber::registry().with(console).with(filter);

    if config.log_json {
        tracing.with(tracing_subscriber::fmt::layer().json()).try_init().ok();
    } else {
        tracing
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .with_target(false),
            )
            .try_init()
            .ok();
    };
}

pub fn add_tracing_layer(app: Router) -> Router {
    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().include_headers(false))
                    .on_request(trace::DefaultOnRequest::new())
                    .on_response(trace::DefaultOnResponse::new().include_headers(false))
                    .on_failure(trace::DefaultOnFailure::new()),
            ),
    )
}
