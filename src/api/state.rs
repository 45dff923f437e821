//! Shared application state for HTTP handlers

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::engine::Engine;
use crate::utils::now_in_seconds;

pub struct AppState {
    /// Handles to the running engine tasks
    pub engine: Engine,

    /// Server start, used as the modification time of bundled assets
    pub started: DateTime<Utc>,

    /// Cancelled to stop serving; open event streams end with it
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            started: now_in_seconds(),
            shutdown: CancellationToken::new(),
        }
    }
}
