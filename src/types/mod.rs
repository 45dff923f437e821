//! Graph types
//!
//! This module contains the aggregate views that input streams are folded
//! into, and the value parsing they share.

mod countable;
mod graph;
mod histogram;
mod log_file;
mod scatter_plot;
mod tally;
mod time_series;

pub use countable::{bucket_of, decode_record, parse_countable, Countable, ParseError, Range};
pub use graph::{Graph, GraphKind};
pub use histogram::Histogram;
pub use log_file::LogFile;
pub use scatter_plot::ScatterPlot;
pub use tally::Tally;
pub use time_series::TimeSeries;

/// Default rendered width, in pixels
pub const DEFAULT_WIDTH: i64 = 500;

/// Default rendered height, in pixels
pub const DEFAULT_HEIGHT: i64 = 500;
