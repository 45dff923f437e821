//! Livegraph
//!
//! A small real-time telemetry dashboard: streams of numbers or lines are
//! folded into live graphs, and every connected browser is pushed updates over
//! server-sent events.
//!
//! # Features
//!
//! - **Four graph kinds**: histogram, time series, scatter plot and rolling log
//! - **Single writer**: one actor task owns all graph state
//! - **Fan-out**: a broadcaster task delivers each update to every viewer
//! - **Change tracking**: only graphs that accepted data are re-sent
//!
//! # Modules
//!
//! - `types`: graph kinds and value parsing
//! - `bind`: setting graph options from query or command line parameters
//! - `engine`: request actor, broadcaster, error watchers and ingestion
//! - `api`: HTTP routes and the event stream
//! - `config`: command line configuration
//! - `utils`: time helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use livegraph::api::{serve, AppState};
//! use livegraph::engine::Engine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = Engine::start(1, 256);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     // Runs until `state.shutdown` is cancelled
//!     serve(listener, Arc::new(AppState::new(engine))).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bind;
pub mod config;
pub mod engine;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use bind::{bind_graph, BindError, Parameters};
pub use config::Config;
pub use engine::{ActorHandle, Broadcaster, Engine, ErrorWatchers, IngestError, Message, SourceError};
pub use types::{Graph, GraphKind, Histogram, LogFile, ScatterPlot, TimeSeries};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Name of the graph fed from standard input, and of the page showing every
/// graph
pub const DEFAULT_GRAPH_NAME: &str = "_";
