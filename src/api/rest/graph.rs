//! Graph upload endpoint

use std::io;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{error, info};

use super::ApiError;
use crate::api::state::AppState;
use crate::bind::{bind_graph, collect_parameters};
use crate::engine::populate_graph;

/// Graph names share the envelope namespace; this prefix is reserved for
/// protocol envelopes such as `__created`.
const RESERVED_PREFIX: &str = "__";

/// Whether `name` can be used for a graph
pub fn valid_graph_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(RESERVED_PREFIX)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// ANY /graph/:kind/:name - create (or replace) a graph and feed it the
/// request body, one record per line.
///
/// Graph options come from the query string. The response is sent once the
/// body has been read to the end.
pub async fn ingest_graph(
    State(state): State<Arc<AppState>>,
    Path((kind, name)): Path<(String, String)>,
    Query(query): Query<Vec<(String, String)>>,
    body: Body,
) -> Response {
    if !valid_graph_name(&name) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request(format!("invalid graph name: {name:?}"))),
        )
            .into_response();
    }

    let graph = match bind_graph(&kind, &collect_parameters(query)) {
        Ok(graph) => graph,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(e.to_string()))).into_response();
        }
    };

    info!(graph = %name, kind = %graph.kind(), "receiving graph data");
    let input = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let engine = &state.engine;
    match populate_graph(name, graph, input, &engine.actor, &engine.ingest_errors).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("graph upload abandoned: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError::internal(e.to_string()))).into_response()
        }
    }
}
