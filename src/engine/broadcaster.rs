//! Publish/subscribe hub for viewer messages
//!
//! # Design
//!
//! The subscriber table is owned by a single dispatch task. Subscribe,
//! unsubscribe and send requests all travel over one channel into that task,
//! so they are applied in the order they were issued and the table needs no
//! lock.
//!
//! Delivery is synchronous: [`Broadcaster::send`] returns only after every
//! matching subscriber's queue has accepted the message. Queues are bounded
//! (capacity 1 by default), so a viewer that stops reading eventually stalls
//! all publishing. A subscriber whose receiving end has been dropped is
//! removed on the next delivery attempt instead of blocking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::message::{Message, SharedMessage};
use super::SendError;

/// Default per-subscriber queue capacity
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 1;

/// A request to the dispatch task
#[derive(Debug)]
enum BroadcastRequest {
    Subscribe {
        name: String,
        id: u64,
        tx: mpsc::Sender<SharedMessage>,
    },
    /// Remove `name`; with an id, only if that registration is still current
    Unsubscribe { name: String, id: Option<u64> },
    Send {
        message: SharedMessage,
        delivered: oneshot::Sender<()>,
    },
}

/// Handle to the dispatch task. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Broadcaster {
    tx: mpsc::UnboundedSender<BroadcastRequest>,
    next_id: Arc<AtomicU64>,
    buffer: usize,
}

impl Broadcaster {
    /// Spawn the dispatch task with the given per-subscriber queue capacity
    pub fn spawn(buffer: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Dispatcher::default().run(rx));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(0)),
            buffer: buffer.max(1),
        }
    }

    /// Register a fresh delivery channel under `name`.
    ///
    /// A previous registration under the same name is replaced, and its
    /// channel closed.
    pub fn subscribe(&self, name: impl Into<String>) -> Subscription {
        let name = name.into();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.buffer);
        // If the dispatcher is gone the receiver simply yields nothing.
        let _ = self.tx.send(BroadcastRequest::Subscribe {
            name: name.clone(),
            id,
            tx,
        });
        Subscription {
            name,
            id,
            rx,
            control: self.tx.clone(),
        }
    }

    /// Remove and close the channel registered under `name`
    pub fn unsubscribe(&self, name: impl Into<String>) {
        let _ = self.tx.send(BroadcastRequest::Unsubscribe {
            name: name.into(),
            id: None,
        });
    }

    /// Deliver `message` to every matching subscriber, waiting until each
    /// has accepted it.
    pub async fn send(&self, message: Message) -> Result<(), SendError> {
        let (delivered, done) = oneshot::channel();
        self.tx
            .send(BroadcastRequest::Send {
                message: Arc::new(message),
                delivered,
            })
            .map_err(|_| SendError::BroadcasterGone)?;
        done.await.map_err(|_| SendError::BroadcasterGone)
    }
}

/// A live registration with the [`Broadcaster`]
///
/// Dropping the subscription unsubscribes it, unless its name has since been
/// taken over by a newer subscription.
#[derive(Debug)]
pub struct Subscription {
    name: String,
    id: u64,
    rx: mpsc::Receiver<SharedMessage>,
    control: mpsc::UnboundedSender<BroadcastRequest>,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next message; `None` once unsubscribed or replaced.
    pub async fn recv(&mut self) -> Option<SharedMessage> {
        self.rx.recv().await
    }

    /// Take a message if one is already queued
    pub fn try_recv(&mut self) -> Option<SharedMessage> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.control.send(BroadcastRequest::Unsubscribe {
            name: std::mem::take(&mut self.name),
            id: Some(self.id),
        });
    }
}

#[derive(Debug)]
struct Listener {
    id: u64,
    tx: mpsc::Sender<SharedMessage>,
}

#[derive(Debug, Default)]
struct Dispatcher {
    listeners: HashMap<String, Listener>,
}

impl Dispatcher {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<BroadcastRequest>) {
        while let Some(request) = rx.recv().await {
            match request {
                BroadcastRequest::Subscribe { name, id, tx } => {
                    debug!(subscriber = %name, "subscribed");
                    self.listeners.insert(name, Listener { id, tx });
                }
                BroadcastRequest::Unsubscribe { name, id } => {
                    let current = self.listeners.get(&name).map(|listener| listener.id);
                    if current.is_some() && (id.is_none() || id == current) {
                        debug!(subscriber = %name, "unsubscribed");
                        self.listeners.remove(&name);
                    }
                }
                BroadcastRequest::Send { message, delivered } => {
                    self.dispatch(&message).await;
                    let _ = delivered.send(());
                }
            }
        }
    }

    async fn dispatch(&mut self, message: &SharedMessage) {
        let mut gone = Vec::new();
        for (name, listener) in &self.listeners {
            if !message.is_recipient(name) {
                continue;
            }
            if listener.tx.send(Arc::clone(message)).await.is_err() {
                gone.push(name.clone());
            }
        }
        for name in gone {
            debug!(subscriber = %name, "dropping disconnected subscriber");
            self.listeners.remove(&name);
        }
    }
}
