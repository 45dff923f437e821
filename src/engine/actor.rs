//! The request actor: sole writer of graph state
//!
//! Every mutation of the [`GraphStore`] arrives as a [`GraphRequest`] on one
//! channel and is applied in arrival order by a single task. Messages produced
//! by a request are handed to the [`Broadcaster`] before the next request is
//! taken, so viewers observe the same order the actor applied.

use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::broadcaster::{Broadcaster, Subscription};
use super::ingest::IngestError;
use super::message::{EncodeError, Message, Recipients, COMPLETED, CREATED};
use super::store::GraphStore;
use super::SendError;
use crate::types::Graph;

/// Default capacity of the request queue
pub const DEFAULT_REQUEST_BUFFER: usize = 256;

/// A command for the request actor
#[derive(Debug)]
pub enum GraphRequest {
    /// Insert or replace a graph and announce it to every viewer
    CreateGraph { name: String, graph: Box<Graph> },
    /// Feed one raw input line to a graph
    Record { name: String, line: Vec<u8> },
    /// A graph's input ended; announced only when it ended with an error
    RecordCompletion {
        name: String,
        error: Option<IngestError>,
    },
    /// Send every graph's announcement and snapshot to one viewer
    DumpAll { recipient: String },
    /// Publish a snapshot of every graph that changed since the last check
    NotifyChanges,
    /// Subscribe `name`, hand back the subscription, then dump to it
    Attach {
        name: String,
        reply: oneshot::Sender<Subscription>,
    },
}

/// Handle to the request actor. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ActorHandle {
    tx: mpsc::Sender<GraphRequest>,
}

impl ActorHandle {
    pub async fn send(&self, request: GraphRequest) -> Result<(), SendError> {
        self.tx.send(request).await.map_err(|_| SendError::ActorGone)
    }

    pub async fn create_graph(&self, name: impl Into<String>, graph: Graph) -> Result<(), SendError> {
        self.send(GraphRequest::CreateGraph {
            name: name.into(),
            graph: Box::new(graph),
        })
        .await
    }

    pub async fn record(&self, name: impl Into<String>, line: Vec<u8>) -> Result<(), SendError> {
        self.send(GraphRequest::Record {
            name: name.into(),
            line,
        })
        .await
    }

    pub async fn record_completion(
        &self,
        name: impl Into<String>,
        error: Option<IngestError>,
    ) -> Result<(), SendError> {
        self.send(GraphRequest::RecordCompletion {
            name: name.into(),
            error,
        })
        .await
    }

    pub async fn dump_all(&self, recipient: impl Into<String>) -> Result<(), SendError> {
        self.send(GraphRequest::DumpAll {
            recipient: recipient.into(),
        })
        .await
    }

    pub async fn notify_changes(&self) -> Result<(), SendError> {
        self.send(GraphRequest::NotifyChanges).await
    }

    /// Subscribe `name` and queue a full dump for it.
    ///
    /// Both happen inside one actor step, so the dump reaches the new
    /// subscriber ahead of any later change notification.
    pub async fn attach(&self, name: impl Into<String>) -> Result<Subscription, SendError> {
        let (reply, subscription) = oneshot::channel();
        self.send(GraphRequest::Attach {
            name: name.into(),
            reply,
        })
        .await?;
        subscription.await.map_err(|_| SendError::ActorGone)
    }
}

/// Owns the graph store and applies requests one at a time
#[derive(Debug)]
pub struct RequestActor {
    store: GraphStore,
    broadcaster: Broadcaster,
}

impl RequestActor {
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self {
            store: GraphStore::new(),
            broadcaster,
        }
    }

    /// Start the actor on its own task
    pub fn spawn(self, buffer: usize) -> ActorHandle {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(self.run(rx));
        ActorHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<GraphRequest>) {
        while let Some(request) = rx.recv().await {
            if let Err(e) = self.handle(request).await {
                error!("request actor stopping: {}", e);
                return;
            }
        }
        debug!("request actor finished: all handles dropped");
    }

    async fn handle(&mut self, request: GraphRequest) -> Result<(), SendError> {
        match request {
            GraphRequest::CreateGraph { name, graph } => {
                info!(graph = %name, kind = %graph.kind(), "graph created");
                self.store.insert(name.clone(), *graph);
                self.broadcaster
                    .send(Message::json(CREATED, &json!({ "name": name })))
                    .await
            }
            GraphRequest::Record { name, line } => {
                match self.store.get_mut(&name) {
                    Some(graph) => graph.record(&line),
                    None => warn!(graph = %name, "dropping record for unknown graph"),
                }
                Ok(())
            }
            GraphRequest::RecordCompletion { name, error } => {
                let Some(error) = error else {
                    return Ok(());
                };
                info!(graph = %name, reason = %error, "graph input finished");
                self.store.reset_indicator(&name);
                self.broadcaster
                    .send(Message::json(
                        COMPLETED,
                        &json!({ "name": name, "reason": error.to_string() }),
                    ))
                    .await
            }
            GraphRequest::DumpAll { recipient } => self.dump_all(recipient).await,
            GraphRequest::NotifyChanges => self.notify_changes().await,
            GraphRequest::Attach { name, reply } => {
                let subscription = self.broadcaster.subscribe(name.clone());
                if reply.send(subscription).is_err() {
                    debug!(subscriber = %name, "viewer left before attaching");
                    return Ok(());
                }
                self.dump_all(name).await
            }
        }
    }

    async fn dump_all(&mut self, recipient: String) -> Result<(), SendError> {
        let recipients = Recipients::only([recipient]);
        let mut messages = Vec::with_capacity(self.store.len() * 2);
        for (name, graph) in self.store.iter() {
            messages.push(Message::json_to(
                recipients.clone(),
                CREATED,
                &json!({ "name": name }),
            ));
            messages.push(snapshot(name, recipients.clone(), graph));
        }
        for message in messages {
            self.broadcaster.send(message).await?;
        }
        Ok(())
    }

    async fn notify_changes(&mut self) -> Result<(), SendError> {
        for name in self.store.poll_changes() {
            let Some(graph) = self.store.get(&name) else {
                continue;
            };
            let message = snapshot(&name, Recipients::All, graph);
            self.broadcaster.send(message).await?;
        }
        Ok(())
    }
}

fn snapshot(name: &str, recipients: Recipients, graph: &Graph) -> Message {
    let contents = graph.render().map_err(|e| EncodeError(e.to_string()));
    Message::new(name, recipients, contents)
}

/// Inject [`GraphRequest::NotifyChanges`] every `period`, starting one period
/// from now. Stops when the actor is gone.
pub fn spawn_notifier(actor: ActorHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if actor.notify_changes().await.is_err() {
                debug!("change notifier stopping: actor gone");
                return;
            }
        }
    })
}
