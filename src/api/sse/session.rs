//! One event stream per connected viewer

use axum::response::sse::Event;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{
    ActorHandle, ErrorWatch, ErrorWatchers, Message, SendError, SourceError, Subscription,
};

/// Payload sent in place of contents that could not be encoded
pub const JSON_ERROR: &str = r#"{"type": "JSON error"}"#;

/// Events buffered between a session and its HTTP response body
const EVENT_BUFFER: usize = 16;

/// Forwards a viewer's subscription onto its response stream until the
/// viewer disconnects or an input it follows ends.
#[derive(Debug)]
pub struct StreamSession {
    name: String,
    subscription: Subscription,
    errors: ErrorWatch,
    out: mpsc::Sender<Event>,
}

impl StreamSession {
    /// Subscribe `name`, queue a full dump for it and start forwarding.
    ///
    /// With `graph` set, only the end of that graph's input ends the session;
    /// otherwise any input ending does. Returns the receiving end of the
    /// event stream; dropping it is the disconnect signal.
    pub async fn open(
        name: String,
        graph: Option<String>,
        actor: &ActorHandle,
        watchers: &ErrorWatchers,
    ) -> Result<mpsc::Receiver<Event>, SendError> {
        let errors = match graph {
            Some(graph) => watchers.watch_graph(name.clone(), graph),
            None => watchers.watch(name.clone()),
        };
        let subscription = actor.attach(name.clone()).await?;
        let (out, events) = mpsc::channel(EVENT_BUFFER);
        let session = Self {
            name,
            subscription,
            errors,
            out,
        };
        tokio::spawn(session.run());
        Ok(events)
    }

    async fn run(mut self) {
        info!(session = %self.name, "session opened");
        loop {
            tokio::select! {
                _ = self.out.closed() => {
                    debug!(session = %self.name, "viewer disconnected");
                    break;
                }
                Some(error) = self.errors.recv() => {
                    info!(
                        session = %self.name,
                        graph = %error.graph,
                        reason = %error.error,
                        "ending session after ingestion error"
                    );
                    let _ = self.out.send(error_event(&error)).await;
                    break;
                }
                message = self.subscription.recv() => {
                    let Some(message) = message else {
                        debug!(session = %self.name, "subscription replaced");
                        break;
                    };
                    if self.out.send(encode_message(&message)).await.is_err() {
                        break;
                    }
                }
            }
        }
        info!(session = %self.name, "session closed");
    }
}

/// Encode a message as `event: <envelope>` plus `data: <contents>`; contents
/// that failed to encode are replaced by [`JSON_ERROR`].
pub fn encode_message(message: &Message) -> Event {
    let event = Event::default().event(message.envelope());
    match message.contents() {
        Ok(contents) => event.data(String::from_utf8_lossy(contents)),
        Err(e) => {
            warn!(envelope = %message.envelope(), "sending placeholder: {}", e);
            event.data(JSON_ERROR)
        }
    }
}

fn error_event(error: &SourceError) -> Event {
    let payload = json!({
        "type": "error",
        "graph": error.graph,
        "error": error.error.to_string(),
    });
    Event::default().data(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{populate_graph, EncodeError, Engine, IngestError, Recipients, CREATED};
    use crate::types::{Graph, GraphKind};
    use axum::response::{IntoResponse, Sse};
    use http_body_util::BodyExt;
    use std::convert::Infallible;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    async fn next(events: &mut mpsc::Receiver<Event>) -> String {
        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        format!("{:?}", event)
    }

    /// The bytes `event` puts on the wire
    async fn wire(event: Event) -> String {
        let stream = futures::stream::iter([Ok::<_, Infallible>(event)]);
        let body = Sse::new(stream).into_response().into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn open(engine: &Engine, graph: Option<&str>) -> mpsc::Receiver<Event> {
        StreamSession::open(
            "viewer".into(),
            graph.map(String::from),
            &engine.actor,
            &engine.watchers,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_starts_with_dump() {
        let engine = Engine::start(1, 16);
        engine
            .actor
            .create_graph("cpu", Graph::new(GraphKind::Histogram))
            .await
            .unwrap();

        let mut events = open(&engine, None).await;

        assert!(next(&mut events).await.contains(CREATED));
        assert!(next(&mut events).await.contains("cpu"));
    }

    #[tokio::test]
    async fn test_ingestion_error_ends_session() {
        let engine = Engine::start(1, 16);
        let mut events = open(&engine, None).await;

        engine
            .ingest_errors
            .send(SourceError::new("cpu", IngestError::EndOfStream))
            .await
            .unwrap();

        let event = wire(timeout(WAIT, events.recv()).await.unwrap().unwrap()).await;
        assert_eq!(event, "data: {\"error\":\"EOF\",\"graph\":\"cpu\",\"type\":\"error\"}\n\n");
        assert!(timeout(WAIT, events.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_outlives_unrelated_input() {
        let engine = Engine::start(1, 16);
        let mut events = open(&engine, Some("cpu")).await;

        populate_graph(
            "other".into(),
            Graph::new(GraphKind::LogFile),
            &b"x\n"[..],
            &engine.actor,
            &engine.ingest_errors,
        )
        .await
        .unwrap();
        assert!(next(&mut events).await.contains(CREATED));
        assert!(next(&mut events).await.contains("EOF"));

        // Later updates still arrive
        engine
            .actor
            .create_graph("later", Graph::new(GraphKind::Histogram))
            .await
            .unwrap();
        let event = next(&mut events).await;
        assert!(event.contains(CREATED) && event.contains("later"), "{event}");

        // The followed graph's input ending still closes the stream
        engine
            .ingest_errors
            .send(SourceError::new("cpu", IngestError::EndOfStream))
            .await
            .unwrap();
        let event = next(&mut events).await;
        assert!(event.contains("error") && event.contains("cpu"), "{event}");
        assert!(timeout(WAIT, events.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_unsubscribes() {
        let engine = Engine::start(1, 16);
        let events = open(&engine, None).await;
        drop(events);

        // With the session gone, publishing must not wait on it
        for _ in 0..3 {
            timeout(WAIT, engine.broadcaster.send(Message::json("x", &1)))
                .await
                .expect("publish blocked on a closed session")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_encode_failure_uses_placeholder() {
        let broken = Message::new("cpu", Recipients::All, Err(EncodeError("nan".into())));

        let event = wire(encode_message(&broken)).await;

        assert_eq!(event, "event: cpu\ndata: {\"type\": \"JSON error\"}\n\n");
    }

    #[tokio::test]
    async fn test_message_wire_format() {
        let event = wire(encode_message(&Message::json("cpu", &json!({ "Count": 2 })))).await;

        assert_eq!(event, "event: cpu\ndata: {\"Count\":2}\n\n");
    }
}
