//! The graph sum type
//!
//! Every graph kind offers the same three operations: record an input line,
//! answer "changed since indicator N?", and render itself as JSON.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::{Histogram, LogFile, ScatterPlot, Tally, TimeSeries};
use crate::bind::{BindError, Bindable, Field};

/// The kinds of graph that can be created by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphKind {
    Histogram,
    TimeSeries,
    ScatterPlot,
    LogFile,
}

impl GraphKind {
    pub const ALL: [GraphKind; 4] = [
        GraphKind::Histogram,
        GraphKind::TimeSeries,
        GraphKind::ScatterPlot,
        GraphKind::LogFile,
    ];

    /// Name used in URLs and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphKind::Histogram => "histogram",
            GraphKind::TimeSeries => "timeseries",
            GraphKind::ScatterPlot => "scatterplot",
            GraphKind::LogFile => "logfile",
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphKind {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BindError::UnknownKind(s.to_string()))
    }
}

/// A live aggregate view over one input stream
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Graph {
    Histogram(Histogram),
    TimeSeries(TimeSeries),
    ScatterPlot(ScatterPlot),
    LogFile(LogFile),
}

impl Graph {
    /// Create an unconfigured graph of the given kind
    pub fn new(kind: GraphKind) -> Self {
        match kind {
            GraphKind::Histogram => Graph::Histogram(Histogram::new()),
            GraphKind::TimeSeries => Graph::TimeSeries(TimeSeries::new()),
            GraphKind::ScatterPlot => Graph::ScatterPlot(ScatterPlot::new()),
            GraphKind::LogFile => Graph::LogFile(LogFile::new()),
        }
    }

    pub fn kind(&self) -> GraphKind {
        match self {
            Graph::Histogram(_) => GraphKind::Histogram,
            Graph::TimeSeries(_) => GraphKind::TimeSeries,
            Graph::ScatterPlot(_) => GraphKind::ScatterPlot,
            Graph::LogFile(_) => GraphKind::LogFile,
        }
    }

    /// Record one raw input line. Unparseable lines count as errors.
    pub fn record(&mut self, raw: &[u8]) {
        match self {
            Graph::Histogram(graph) => graph.record(raw),
            Graph::TimeSeries(graph) => graph.record(raw),
            Graph::ScatterPlot(graph) => graph.record(raw),
            Graph::LogFile(graph) => graph.record(raw),
        }
    }

    /// Whether anything was accepted since `indicator`, and the indicator to
    /// pass next time.
    pub fn changed(&self, indicator: u64) -> (bool, u64) {
        self.tally().changed(indicator)
    }

    pub fn tally(&self) -> &Tally {
        match self {
            Graph::Histogram(graph) => &graph.tally,
            Graph::TimeSeries(graph) => &graph.tally,
            Graph::ScatterPlot(graph) => &graph.tally,
            Graph::LogFile(graph) => &graph.tally,
        }
    }

    /// Render the current state as JSON
    pub fn render(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl From<Histogram> for Graph {
    fn from(graph: Histogram) -> Self {
        Graph::Histogram(graph)
    }
}

impl From<TimeSeries> for Graph {
    fn from(graph: TimeSeries) -> Self {
        Graph::TimeSeries(graph)
    }
}

impl From<ScatterPlot> for Graph {
    fn from(graph: ScatterPlot) -> Self {
        Graph::ScatterPlot(graph)
    }
}

impl From<LogFile> for Graph {
    fn from(graph: LogFile) -> Self {
        Graph::LogFile(graph)
    }
}

impl Bindable for Graph {
    fn fields(&mut self) -> Vec<Field<'_>> {
        match self {
            Graph::Histogram(graph) => graph.fields(),
            Graph::TimeSeries(graph) => graph.fields(),
            Graph::ScatterPlot(graph) => graph.fields(),
            Graph::LogFile(graph) => graph.fields(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_names() {
        for kind in GraphKind::ALL {
            assert_eq!(kind.as_str().parse::<GraphKind>(), Ok(kind));
            assert_eq!(Graph::new(kind).kind(), kind);
        }
        assert!("Histogram".parse::<GraphKind>().is_err());
    }

    #[test]
    fn test_every_kind_starts_unchanged() {
        for kind in GraphKind::ALL {
            let graph = Graph::new(kind);
            assert_eq!(graph.changed(0), (false, 0), "{kind}");
        }
    }

    #[test]
    fn test_every_kind_changes_after_one_record() {
        for kind in GraphKind::ALL {
            let mut graph = Graph::new(kind);
            graph.record(b"1 2\n");
            if kind != GraphKind::ScatterPlot && kind != GraphKind::LogFile {
                // "1 2" is not a single number
                assert_eq!(graph.changed(0), (false, 0), "{kind}");
                graph.record(b"1\n");
            }

            let (changed, next) = graph.changed(0);
            assert!(changed, "{kind}");
            assert!(next > 0, "{kind}");
            assert_eq!(graph.changed(next), (false, next), "{kind}");
        }
    }

    #[test]
    fn test_render_uses_variant_layout() {
        let graph = Graph::from(LogFile::new());
        let json: serde_json::Value = serde_json::from_slice(&graph.render().unwrap()).unwrap();
        assert_eq!(json["Layout"], "logfile");
        assert_eq!(json["Window"], 1000);
    }
}
