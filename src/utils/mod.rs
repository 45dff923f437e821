//! Utility functions and helpers
//!
//! This module contains timestamp utilities shared by graphs and HTTP handlers.

pub mod time;

pub use time::{http_date, now_in_seconds, parse_http_date, timestamp_key};
