//! Fan-out of ingestion errors to interested sessions
//!
//! Same discipline as the broadcaster: one loop owns the watcher table and
//! every change to it, plus every error to forward, arrives over one channel.
//! Watcher channels are unbounded, so a session that is slow to notice an
//! error never holds up the others.
//!
//! A watcher either follows every input or only the input feeding one graph.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::ingest::SourceError;

#[derive(Debug)]
enum WatchRequest {
    Watch {
        name: String,
        id: u64,
        graph: Option<String>,
        tx: mpsc::UnboundedSender<SourceError>,
    },
    Unwatch { name: String, id: Option<u64> },
    Error(SourceError),
}

#[derive(Debug)]
struct Watcher {
    id: u64,
    /// Only errors from this graph's input; every input when unset
    graph: Option<String>,
    tx: mpsc::UnboundedSender<SourceError>,
}

impl Watcher {
    fn wants(&self, error: &SourceError) -> bool {
        self.graph.as_ref().map_or(true, |graph| *graph == error.graph)
    }
}

/// Handle to the watcher loop. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ErrorWatchers {
    tx: mpsc::UnboundedSender<WatchRequest>,
    next_id: Arc<AtomicU64>,
}

impl ErrorWatchers {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register for errors from every input under `name`, replacing any
    /// earlier registration
    pub fn watch(&self, name: impl Into<String>) -> ErrorWatch {
        self.register(name.into(), None)
    }

    /// Register under `name` for errors from the input feeding `graph` only
    pub fn watch_graph(&self, name: impl Into<String>, graph: impl Into<String>) -> ErrorWatch {
        self.register(name.into(), Some(graph.into()))
    }

    fn register(&self, name: String, graph: Option<String>) -> ErrorWatch {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.tx.send(WatchRequest::Watch {
            name: name.clone(),
            id,
            graph,
            tx,
        });
        ErrorWatch {
            name,
            id,
            rx,
            control: self.tx.clone(),
        }
    }

    /// Deregister `name` and close its channel
    pub fn unwatch(&self, name: impl Into<String>) {
        let _ = self.tx.send(WatchRequest::Unwatch {
            name: name.into(),
            id: None,
        });
    }

    /// Forward every error read from `source` to the watchers that want it
    pub fn broadcast(&self, mut source: mpsc::Receiver<SourceError>) -> JoinHandle<()> {
        let control = self.tx.clone();
        tokio::spawn(async move {
            while let Some(error) = source.recv().await {
                if control.send(WatchRequest::Error(error)).is_err() {
                    return;
                }
            }
        })
    }
}

/// A registration with [`ErrorWatchers`]; dropping it unwatches.
#[derive(Debug)]
pub struct ErrorWatch {
    name: String,
    id: u64,
    rx: mpsc::UnboundedReceiver<SourceError>,
    control: mpsc::UnboundedSender<WatchRequest>,
}

impl ErrorWatch {
    /// Next error; `None` once unwatched
    pub async fn recv(&mut self) -> Option<SourceError> {
        self.rx.recv().await
    }
}

impl Drop for ErrorWatch {
    fn drop(&mut self) {
        let _ = self.control.send(WatchRequest::Unwatch {
            name: std::mem::take(&mut self.name),
            id: Some(self.id),
        });
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<WatchRequest>) {
    let mut watchers: HashMap<String, Watcher> = HashMap::new();
    while let Some(request) = rx.recv().await {
        match request {
            WatchRequest::Watch { name, id, graph, tx } => {
                watchers.insert(name, Watcher { id, graph, tx });
            }
            WatchRequest::Unwatch { name, id } => {
                if watchers
                    .get(&name)
                    .is_some_and(|current| id.map_or(true, |id| id == current.id))
                {
                    watchers.remove(&name);
                }
            }
            WatchRequest::Error(error) => {
                debug!(graph = %error.graph, error = %error.error, "forwarding ingestion error");
                watchers.retain(|_, watcher| {
                    !watcher.wants(&error) || watcher.tx.send(error.clone()).is_ok()
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::IngestError;

    fn ended(graph: &str) -> SourceError {
        SourceError::new(graph, IngestError::EndOfStream)
    }

    #[tokio::test]
    async fn test_errors_reach_every_watcher() {
        let watchers = ErrorWatchers::spawn();
        let mut a = watchers.watch("a");
        let mut b = watchers.watch("b");
        let (tx, rx) = mpsc::channel(4);
        watchers.broadcast(rx);

        let broken = SourceError::new("disk", IngestError::Read("broken pipe".into()));
        tx.send(ended("cpu")).await.unwrap();
        tx.send(broken.clone()).await.unwrap();

        assert_eq!(a.recv().await, Some(ended("cpu")));
        assert_eq!(b.recv().await, Some(ended("cpu")));
        assert_eq!(a.recv().await, Some(broken));
    }

    #[tokio::test]
    async fn test_graph_watch_skips_other_inputs() {
        let watchers = ErrorWatchers::spawn();
        let mut cpu = watchers.watch_graph("viewer", "cpu");
        let mut everything = watchers.watch("all");
        let (tx, rx) = mpsc::channel(4);
        watchers.broadcast(rx);

        tx.send(ended("other")).await.unwrap();
        tx.send(ended("cpu")).await.unwrap();

        assert_eq!(everything.recv().await, Some(ended("other")));
        assert_eq!(everything.recv().await, Some(ended("cpu")));
        assert_eq!(cpu.recv().await, Some(ended("cpu")));
    }

    #[tokio::test]
    async fn test_unwatch_closes_channel() {
        let watchers = ErrorWatchers::spawn();
        let mut a = watchers.watch("a");

        watchers.unwatch("a");

        assert_eq!(a.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropped_watch_keeps_replacement() {
        let watchers = ErrorWatchers::spawn();
        let old = watchers.watch("a");
        let mut new = watchers.watch("a");
        drop(old);

        let (tx, rx) = mpsc::channel(1);
        watchers.broadcast(rx);
        tx.send(ended("cpu")).await.unwrap();

        assert_eq!(new.recv().await, Some(ended("cpu")));
    }
}
