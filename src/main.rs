//! Livegraph - Binary Entry Point

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use livegraph::api::{serve, AppState};
use livegraph::bind::bind_graph;
use livegraph::engine::{populate_graph, spawn_notifier, Engine};
use livegraph::{Config, DEFAULT_GRAPH_NAME};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_directive())),
        )
        .init();

    let engine = Engine::start(config.subscriber_buffer, config.request_buffer);
    spawn_notifier(engine.actor.clone(), config.update_interval());

    let reading_stdin = config.kind.is_some();
    if let Some(kind) = config.kind {
        let graph = bind_graph(kind.as_str(), &config.graph_parameters())?;
        let actor = engine.actor.clone();
        let errors = engine.ingest_errors.clone();
        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            if let Err(e) = populate_graph(DEFAULT_GRAPH_NAME.to_string(), graph, stdin, &actor, &errors).await {
                error!("reading standard input stopped: {}", e);
            }
        });
    }

    let state = Arc::new(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("cannot listen on {}", config.listen))?;
    info!("serving on http://{}", config.listen);

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for ctrl-c: {}", e);
            return;
        }
        info!("received ctrl-c, shutting down");
        shutdown.cancel();
    });

    serve(listener, state).await?;
    info!("server stopped");
    if reading_stdin {
        // A pending stdin read would keep the runtime from shutting down
        std::process::exit(0);
    }
    Ok(())
}
