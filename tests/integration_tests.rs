//! Integration tests for the livegraph engine and HTTP server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use livegraph::api::{serve, AppState};
use livegraph::bind::{bind_graph, collect_parameters};
use livegraph::engine::{
    populate_graph, spawn_notifier, Engine, IngestError, Message, Recipients, SourceError,
    Subscription, CREATED,
};

const WAIT: Duration = Duration::from_secs(5);

async fn ingest(engine: &Engine, name: &str, kind: &str, query: &[(&str, &str)], input: &'static str) {
    let graph = bind_graph(kind, &collect_parameters(query.iter().copied())).unwrap();
    populate_graph(
        name.to_string(),
        graph,
        input.as_bytes(),
        &engine.actor,
        &engine.ingest_errors,
    )
    .await
    .unwrap();
}

async fn next(viewer: &mut Subscription) -> Arc<Message> {
    timeout(WAIT, viewer.recv()).await.unwrap().unwrap()
}

fn json(message: &Message) -> Value {
    serde_json::from_slice(message.contents().unwrap()).unwrap()
}

/// The snapshot a freshly attached viewer receives for `name`
async fn snapshot_of(engine: &Engine, name: &str) -> Value {
    let mut viewer = engine.actor.attach("snapshot-reader").await.unwrap();
    loop {
        let message = next(&mut viewer).await;
        if message.envelope() == name {
            return json(&message);
        }
    }
}

#[tokio::test]
async fn test_histogram_end_to_end() {
    let engine = Engine::start(1, 64);
    ingest(&engine, "cpu", "histogram", &[("bucket", "1")], "4\n4.9\n0.1\n-0.1\n").await;

    let graph = snapshot_of(&engine, "cpu").await;

    assert_eq!(graph["Layout"], "histogram");
    assert_eq!(graph["Values"], serde_json::json!({"4": 2, "0": 1, "-1": 1}));
    assert_eq!(graph["Min"], -0.1);
    assert_eq!(graph["Max"], 4.9);
    assert!((graph["Sum"].as_f64().unwrap() - 8.9).abs() < 1e-9);
    assert_eq!(graph["Count"], 4);
    assert_eq!(graph["Filtered"], 0);
    assert_eq!(graph["Errors"], 0);
}

#[tokio::test]
async fn test_filtered_and_malformed_records() {
    let engine = Engine::start(1, 64);
    ingest(&engine, "temp", "histogram", &[("min", "0")], "3\n-2\nwarm\n5\n").await;

    let graph = snapshot_of(&engine, "temp").await;

    assert_eq!(graph["Count"], 2);
    assert_eq!(graph["Filtered"], 1);
    assert_eq!(graph["Errors"], 1);
    assert_eq!(graph["Min"], 3.0);
    assert_eq!(graph["Sum"], 8.0);
}

#[tokio::test]
async fn test_log_window_keeps_latest_lines() {
    let engine = Engine::start(1, 64);
    ingest(&engine, "log", "logfile", &[("window", "2")], "a\nb\nc\nd\n").await;

    let graph = snapshot_of(&engine, "log").await;

    assert_eq!(graph["Values"], serde_json::json!({"2": "c", "3": "d"}));
    assert_eq!(graph["Count"], 4);
}

#[tokio::test]
async fn test_dump_precedes_change_notifications() {
    let engine = Engine::start(1, 64);
    for name in ["a", "b", "c"] {
        ingest(&engine, name, "histogram", &[], "1\n2\n").await;
    }
    engine.actor.notify_changes().await.unwrap();
    let _notifier = spawn_notifier(engine.actor.clone(), Duration::from_millis(5));

    let mut viewer = engine.actor.attach("viewer").await.unwrap();
    engine.actor.record("b", b"3\n".to_vec()).await.unwrap();

    let mut dumped = Vec::new();
    for _ in 0..6 {
        let message = next(&mut viewer).await;
        assert_ne!(message.recipients(), &Recipients::All, "notification before dump");
        if message.envelope() == CREATED {
            dumped.push(json(&message)["name"].as_str().unwrap().to_string());
        }
    }
    assert_eq!(dumped, vec!["a", "b", "c"]);

    // The new record shows up through the periodic notifier
    let update = next(&mut viewer).await;
    assert_eq!(update.envelope(), "b");
    assert_eq!(update.recipients(), &Recipients::All);
}

#[tokio::test]
async fn test_input_end_reaches_watchers() {
    let engine = Engine::start(1, 64);
    let mut everything = engine.watchers.watch("viewer");
    let mut cpu_only = engine.watchers.watch_graph("cpu-viewer", "cpu");

    ingest(&engine, "disk", "timeseries", &[], "1\n").await;
    ingest(&engine, "cpu", "timeseries", &[], "1\n").await;

    let disk_ended = SourceError::new("disk", IngestError::EndOfStream);
    let cpu_ended = SourceError::new("cpu", IngestError::EndOfStream);
    assert_eq!(timeout(WAIT, everything.recv()).await.unwrap(), Some(disk_ended));
    assert_eq!(timeout(WAIT, everything.recv()).await.unwrap(), Some(cpu_ended.clone()));
    assert_eq!(timeout(WAIT, cpu_only.recv()).await.unwrap(), Some(cpu_ended));
}

async fn start_server() -> (Arc<AppState>, SocketAddr) {
    let engine = Engine::start(1, 64);
    let mut input_done = engine.watchers.watch("setup");
    ingest(&engine, "cpu", "histogram", &[], "1\n").await;
    // The end of input must be fanned out before any viewer connects, or it
    // would end that viewer's session.
    assert!(input_done.recv().await.is_some());
    drop(input_done);
    let state = Arc::new(AppState::new(engine));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state.clone()));
    (state, addr)
}

async fn read_until(stream: &mut TcpStream, needle: &str) -> String {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    while !String::from_utf8_lossy(&received).contains(needle) {
        let n = timeout(WAIT, stream.read(&mut buf)).await.unwrap().unwrap();
        assert!(n > 0, "connection closed early");
        received.extend_from_slice(&buf[..n]);
    }
    String::from_utf8_lossy(&received).into_owned()
}

#[tokio::test]
async fn test_event_stream_over_tcp() {
    let (_state, addr) = start_server().await;

    // Every new connection gets its own dump
    for _ in 0..2 {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /data HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let received = read_until(&mut stream, "event: cpu").await;
        let lower = received.to_ascii_lowercase();
        assert!(lower.starts_with("http/1.1 200"));
        assert!(lower.contains("content-type: text/event-stream"));
        assert!(received.contains("event: __created\ndata: {\"name\":\"cpu\"}"));
    }
}

#[tokio::test]
async fn test_graph_page_survives_other_uploads_over_tcp() {
    let (state, addr) = start_server().await;

    let mut viewer = TcpStream::connect(addr).await.unwrap();
    viewer
        .write_all(b"GET /data?graph=cpu HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    read_until(&mut viewer, "event: cpu").await;

    let mut upload = TcpStream::connect(addr).await.unwrap();
    upload
        .write_all(
            b"PUT /graph/logfile/other HTTP/1.1\r\nHost: localhost\r\n\
              Content-Length: 2\r\nConnection: close\r\n\r\nx\n",
        )
        .await
        .unwrap();
    read_until(&mut upload, "200 OK").await;

    // Still streaming: the next graph announcement arrives
    ingest(&state.engine, "later", "histogram", &[], "").await;
    let received = read_until(&mut viewer, "{\"name\":\"later\"}").await;
    assert!(!received.contains("\"type\":\"error\""), "{received}");
}

#[tokio::test]
async fn test_shutdown_ends_open_streams() {
    let (state, addr) = start_server().await;

    let mut viewer = TcpStream::connect(addr).await.unwrap();
    viewer
        .write_all(b"GET /data HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    read_until(&mut viewer, "event: cpu").await;

    state.shutdown.cancel();

    let mut rest = Vec::new();
    timeout(WAIT, viewer.read_to_end(&mut rest)).await.unwrap().unwrap();
}
