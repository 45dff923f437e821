//! HTTP API
//!
//! REST endpoints for the dashboard and for uploading graph data, plus the
//! server-sent event stream that pushes graph updates to viewers.

pub mod http;
pub mod rest;
pub mod sse;
pub mod state;

pub use http::{create_router, serve};
pub use state::AppState;
