//! `GET /data`: the viewer event stream

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::Deserialize;
use tracing::error;

use super::session::StreamSession;
use crate::api::rest::ApiError;
use crate::api::state::AppState;
use crate::DEFAULT_GRAPH_NAME;

/// Interval between SSE keep-alive comments
const KEEP_ALIVE: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    /// Graph the viewer is showing; `_` or absent means all of them
    pub graph: Option<String>,
}

impl DataQuery {
    fn followed_graph(self) -> Option<String> {
        self.graph.filter(|graph| graph != DEFAULT_GRAPH_NAME)
    }
}

/// GET /data - open a server-sent event stream for this connection.
///
/// The viewer is identified by its remote address. Connections served
/// without peer information cannot be tracked and are refused.
pub async fn data_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DataQuery>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let Some(ConnectInfo(addr)) = connect_info else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::internal("connection not suitable for event streaming")),
        )
            .into_response();
    };

    let engine = &state.engine;
    let opened = StreamSession::open(
        addr.to_string(),
        query.followed_graph(),
        &engine.actor,
        &engine.watchers,
    )
    .await;
    let mut events = match opened {
        Ok(events) => events,
        Err(e) => {
            error!(viewer = %addr, "cannot open session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal(e.to_string())),
            )
                .into_response();
        }
    };

    // Dropping `events` on shutdown ends the session too
    let shutdown = state.shutdown.clone();
    let stream = async_stream::stream! {
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            yield Ok::<_, Infallible>(event);
        }
    };

    (
        [(header::CONNECTION, "keep-alive")],
        Sse::new(stream).keep_alive(KeepAlive::default().interval(KEEP_ALIVE)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_graph_follows_every_input() {
        let query = |graph: Option<&str>| DataQuery {
            graph: graph.map(String::from),
        };

        assert_eq!(query(Some("cpu")).followed_graph(), Some("cpu".to_string()));
        assert_eq!(query(Some("_")).followed_graph(), None);
        assert_eq!(query(None).followed_graph(), None);
    }
}
