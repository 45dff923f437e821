//! Reading an input stream into a graph

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::actor::ActorHandle;
use super::SendError;
use crate::types::Graph;

/// Why an input stream stopped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("EOF")]
    EndOfStream,
    #[error("{0}")]
    Read(String),
}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        IngestError::Read(e.to_string())
    }
}

/// An input that stopped, tagged with the graph it was feeding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub graph: String,
    pub error: IngestError,
}

impl SourceError {
    pub fn new(graph: impl Into<String>, error: IngestError) -> Self {
        Self {
            graph: graph.into(),
            error,
        }
    }
}

/// Create `name` from `graph`, then feed it every line of `input`.
///
/// Lines are handed to the actor as they are read; a final line without a
/// trailing newline is still recorded. When the input ends, the reason is
/// sent to the actor as a completion and pushed to `errors` under `name`.
pub async fn populate_graph<R>(
    name: String,
    graph: Graph,
    input: R,
    actor: &ActorHandle,
    errors: &mpsc::Sender<SourceError>,
) -> Result<(), SendError>
where
    R: AsyncRead + Unpin,
{
    actor.create_graph(name.clone(), graph).await?;

    let mut reader = BufReader::new(input);
    let mut line = Vec::new();
    let mut lines = 0u64;
    let reason = loop {
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break IngestError::EndOfStream,
            Ok(_) => {
                lines += 1;
                actor.record(name.clone(), std::mem::take(&mut line)).await?;
            }
            Err(e) => break IngestError::from(e),
        }
    };

    match &reason {
        IngestError::EndOfStream => info!(graph = %name, lines, "finished reading data"),
        IngestError::Read(e) => warn!(graph = %name, lines, "reading data failed: {}", e),
    }

    actor.record_completion(name.clone(), Some(reason.clone())).await?;
    if errors.send(SourceError::new(name, reason)).await.is_err() {
        debug!("no error watchers are listening");
    }
    Ok(())
}
