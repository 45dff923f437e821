//! REST endpoints
//!
//! - `GET /`, `GET /:name` - dashboard page for a graph
//! - `GET /script.js` - dashboard script
//! - `ANY /graph/:kind/:name` - create a graph and stream data into it

pub mod assets;
pub mod graph;

use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "BAD_REQUEST".to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INTERNAL_ERROR".to_string(),
        }
    }
}
