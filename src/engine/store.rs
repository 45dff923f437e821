//! Named graphs plus the change indicator last reported for each

use std::collections::{BTreeMap, HashMap};

use crate::types::Graph;

/// Graph collection owned by the request actor
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: BTreeMap<String, Graph>,
    indicators: HashMap<String, u64>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a graph. A replaced graph starts over from
    /// indicator zero.
    pub fn insert(&mut self, name: impl Into<String>, graph: Graph) {
        let name = name.into();
        self.indicators.insert(name.clone(), 0);
        self.graphs.insert(name, graph);
    }

    pub fn get(&self, name: &str) -> Option<&Graph> {
        self.graphs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Graph> {
        self.graphs.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Graphs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Graph)> {
        self.graphs.iter().map(|(name, graph)| (name.as_str(), graph))
    }

    /// Last indicator reported for `name`
    pub fn indicator(&self, name: &str) -> u64 {
        self.indicators.get(name).copied().unwrap_or(0)
    }

    pub fn reset_indicator(&mut self, name: &str) {
        if let Some(indicator) = self.indicators.get_mut(name) {
            *indicator = 0;
        }
    }

    /// Names of graphs that accepted data since the last poll, advancing
    /// their stored indicators.
    pub fn poll_changes(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        for (name, graph) in &self.graphs {
            let indicator = self.indicators.entry(name.clone()).or_insert(0);
            let (is_changed, next) = graph.changed(*indicator);
            if is_changed {
                *indicator = next;
                changed.push(name.clone());
            }
        }
        changed
    }
}
