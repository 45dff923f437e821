//! Parameter binding
//!
//! Configures a value from a multi-valued map of string parameters, the shape
//! produced by URL query strings and by the command line. A bindable type
//! lists its fields; each field is matched against the parameter map by its
//! lowercased name, or by an explicit tag when one is given, and assigned by
//! converting the first provided string to the field's type. Fields without a
//! parameter, or whose value does not convert, keep their current value.

use std::collections::HashMap;

use crate::types::{Graph, GraphKind};

/// Parameter name to one or more values
pub type Parameters = HashMap<String, Vec<String>>;

/// Error returned when a target cannot be bound
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("unknown graph type: {0:?}")]
    UnknownKind(String),
}

/// Mutable view of a single bindable field
#[derive(Debug)]
pub enum Slot<'a> {
    Int(&'a mut i64),
    Float(&'a mut f64),
    Bool(&'a mut bool),
    Text(&'a mut String),
    TextList(&'a mut Vec<String>),
}

/// A named field exposed for binding
#[derive(Debug)]
pub struct Field<'a> {
    name: &'static str,
    tag: Option<&'static str>,
    slot: Slot<'a>,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, slot: Slot<'a>) -> Self {
        Self {
            name,
            tag: None,
            slot,
        }
    }

    /// Bind this field under `tag` instead of its lowercased name
    pub fn tagged(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// The parameter key this field is looked up by
    pub fn key(&self) -> String {
        match self.tag {
            Some(tag) => tag.to_string(),
            None => self.name.to_lowercase(),
        }
    }

    /// Assign from parameter values; returns whether the field was set.
    fn assign(self, values: &[String]) -> bool {
        match (self.slot, values.first()) {
            (Slot::TextList(target), _) => {
                *target = values.to_vec();
                true
            }
            (_, None) => false,
            (Slot::Int(target), Some(first)) => {
                first.trim().parse::<i64>().map(|v| *target = v).is_ok()
            }
            (Slot::Float(target), Some(first)) => {
                first.trim().parse::<f64>().map(|v| *target = v).is_ok()
            }
            (Slot::Bool(target), Some(first)) => {
                parse_bool(first.trim()).map(|v| *target = v).is_some()
            }
            (Slot::Text(target), Some(first)) => {
                *target = first.clone();
                true
            }
        }
    }
}

/// Types whose fields can be set from [`Parameters`]
pub trait Bindable {
    fn fields(&mut self) -> Vec<Field<'_>>;
}

/// Set the fields of `target` from `params`, returning how many were assigned.
pub fn bind<B: Bindable + ?Sized>(target: &mut B, params: &Parameters) -> usize {
    let mut assigned = 0;
    for field in target.fields() {
        if let Some(values) = params.get(&field.key()) {
            if field.assign(values) {
                assigned += 1;
            }
        }
    }
    assigned
}

/// Build a graph of the named kind and bind its options from `params`.
pub fn bind_graph(kind: &str, params: &Parameters) -> Result<Graph, BindError> {
    let kind: GraphKind = kind.parse()?;
    let mut graph = Graph::new(kind);
    bind(&mut graph, params);
    Ok(graph)
}

/// Collect `(key, value)` pairs, such as a decoded query string, into
/// [`Parameters`], keeping every value given for a repeated key.
pub fn collect_parameters<I, K, V>(pairs: I) -> Parameters
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut params = Parameters::new();
    for (key, value) in pairs {
        params.entry(key.into()).or_default().push(value.into());
    }
    params
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
