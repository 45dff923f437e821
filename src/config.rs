//! Command line and environment configuration

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::bind::{collect_parameters, Parameters};
use crate::engine::{DEFAULT_REQUEST_BUFFER, DEFAULT_SUBSCRIBER_BUFFER};
use crate::types::{GraphKind, LogFile};

/// Stream numbers or lines into live graphs served over HTTP.
///
/// With a graph kind, standard input feeds a graph named `_`. Graphs can also
/// be uploaded to `/graph/<kind>/<name>` with any method.
#[derive(Debug, Clone, Parser)]
#[command(name = "livegraph", version, about)]
pub struct Config {
    /// Kind of graph to build from standard input
    #[arg(value_parser = parse_kind)]
    pub kind: Option<GraphKind>,

    /// Address to serve the dashboard on
    #[arg(long, env = "LIVEGRAPH_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Log at debug level
    #[arg(short, long, env = "LIVEGRAPH_VERBOSE")]
    pub verbose: bool,

    /// Seconds between change notifications
    #[arg(long, env = "LIVEGRAPH_DELAY", default_value_t = 5,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub delay: u64,

    /// Messages queued per viewer before publishing waits on it
    #[arg(long, env = "LIVEGRAPH_SUBSCRIBER_BUFFER", default_value_t = DEFAULT_SUBSCRIBER_BUFFER)]
    pub subscriber_buffer: usize,

    /// Requests queued for the graph actor before senders wait
    #[arg(long, env = "LIVEGRAPH_REQUEST_BUFFER", default_value_t = DEFAULT_REQUEST_BUFFER)]
    pub request_buffer: usize,

    /// Graph label
    #[arg(long)]
    pub label: Option<String>,

    /// Smallest value counted; anything lower is filtered
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Largest value counted; anything higher is filtered
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,

    /// Histogram bucket size
    #[arg(long)]
    pub bucket: Option<i64>,

    /// Draw histogram bars wide
    #[arg(long)]
    pub wide: bool,

    /// Graph width in pixels
    #[arg(long)]
    pub width: Option<i64>,

    /// Graph height in pixels
    #[arg(long)]
    pub height: Option<i64>,

    /// Color scheme passed through to the page
    #[arg(long)]
    pub colors: Option<String>,

    /// Font size passed through to the page
    #[arg(long)]
    pub font_size: Option<String>,

    /// Entries kept by time series and log graphs
    #[arg(long, default_value_t = LogFile::DEFAULT_WINDOW)]
    pub window: i64,
}

impl Config {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.delay.max(1))
    }

    /// Graph options given on the command line, keyed the way the binder
    /// expects query parameters. Only options that were given are included,
    /// apart from the window, which always has a value.
    pub fn graph_parameters(&self) -> Parameters {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(label) = &self.label {
            pairs.push(("label", label.clone()));
        }
        if let Some(min) = self.min {
            pairs.push(("min", min.to_string()));
        }
        if let Some(max) = self.max {
            pairs.push(("max", max.to_string()));
        }
        if let Some(bucket) = self.bucket {
            pairs.push(("bucket", bucket.to_string()));
        }
        if self.wide {
            pairs.push(("wide", "true".to_string()));
        }
        if let Some(width) = self.width {
            pairs.push(("width", width.to_string()));
        }
        if let Some(height) = self.height {
            pairs.push(("height", height.to_string()));
        }
        if let Some(colors) = &self.colors {
            pairs.push(("colors", colors.clone()));
        }
        if let Some(font_size) = &self.font_size {
            pairs.push(("fontsize", font_size.clone()));
        }
        pairs.push(("window", self.window.to_string()));
        collect_parameters(pairs)
    }

    /// Directive for the log filter when `RUST_LOG` is not set
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "livegraph=debug"
        } else {
            "livegraph=info"
        }
    }
}

fn parse_kind(value: &str) -> Result<GraphKind, String> {
    value.parse().map_err(|_| {
        let kinds: Vec<&str> = GraphKind::ALL.iter().map(GraphKind::as_str).collect();
        format!("expected one of: {}", kinds.join(", "))
    })
}
