//! HTTP server setup with Axum

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::{assets, graph};
use super::sse::data_handler;
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Viewers may be served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(assets::index))
        .route("/script.js", get(assets::script))
        .route("/data", get(data_handler))
        .route("/health", get(health_check))
        .route("/graph/:kind/:name", any(graph::ingest_graph))
        .route("/:name", get(assets::index_for))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the dashboard on `listener` until `state.shutdown` is cancelled.
///
/// Viewers are identified by their peer address, so the router is served
/// with connect info.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> io::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
