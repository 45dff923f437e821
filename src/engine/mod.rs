//! Aggregation and broadcast engine
//!
//! Tasks, all communicating over channels:
//!
//! - [`RequestActor`]: the only writer of graph state
//! - [`Broadcaster`]: fans messages out to subscribed viewers
//! - [`ErrorWatchers`]: fans ingestion errors out to viewers
//! - one [`populate_graph`] task per input stream
//!
//! [`Engine::start`] wires the first three together.

pub mod actor;
pub mod broadcaster;
pub mod ingest;
pub mod message;
pub mod store;
pub mod watchers;

use tokio::sync::mpsc;

pub use actor::{spawn_notifier, ActorHandle, GraphRequest, RequestActor, DEFAULT_REQUEST_BUFFER};
pub use broadcaster::{Broadcaster, Subscription, DEFAULT_SUBSCRIBER_BUFFER};
pub use ingest::{populate_graph, IngestError, SourceError};
pub use message::{EncodeError, Message, Recipients, SharedMessage, COMPLETED, CREATED};
pub use store::GraphStore;
pub use watchers::{ErrorWatch, ErrorWatchers};

/// Capacity of the channel carrying ingestion errors to the watchers
const INGEST_ERROR_BUFFER: usize = 16;

/// A task on the other end of a channel has shut down
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("request actor has shut down")]
    ActorGone,
    #[error("broadcaster has shut down")]
    BroadcasterGone,
}

/// Running engine tasks and the handles to reach them
#[derive(Clone, Debug)]
pub struct Engine {
    pub actor: ActorHandle,
    pub broadcaster: Broadcaster,
    pub watchers: ErrorWatchers,
    /// Where ingestion tasks report why their input ended
    pub ingest_errors: mpsc::Sender<SourceError>,
}

impl Engine {
    /// Spawn the broadcaster, request actor and error watchers
    pub fn start(subscriber_buffer: usize, request_buffer: usize) -> Self {
        let broadcaster = Broadcaster::spawn(subscriber_buffer);
        let actor = RequestActor::new(broadcaster.clone()).spawn(request_buffer);
        let watchers = ErrorWatchers::spawn();
        let (ingest_errors, source) = mpsc::channel(INGEST_ERROR_BUFFER);
        watchers.broadcast(source);
        Self {
            actor,
            broadcaster,
            watchers,
            ingest_errors,
        }
    }
}
