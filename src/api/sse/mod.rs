//! Server-sent event delivery to viewers
//!
//! ## Endpoints
//! - `GET /data[?graph=<name>]` - stream of graph announcements and snapshots
//!
//! Each pushed update is an `event: <envelope>` line followed by
//! `data: <json>`. Envelopes are `__created`, `__completed` and graph names.
//! The stream ends with an unnamed `{"type":"error"}` event when an input
//! ends: the named graph's input, or any input without `graph`.

pub mod handler;
pub mod session;

pub use handler::{data_handler, DataQuery};
pub use session::{encode_message, StreamSession, JSON_ERROR};
