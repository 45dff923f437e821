//! Scatter plot: (x, y) pairs with running min/max of y

use std::collections::BTreeMap;

use serde::Serialize;

use super::countable::{decode_record, parse_countable, Countable, ParseError, Range};
use super::Tally;
use crate::bind::{Bindable, Field, Slot};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScatterPlot {
    /// Points keyed `"<x>|<n>"`, where `n` is the point's acceptance order
    pub values: BTreeMap<String, Countable>,

    pub layout: &'static str,
    pub label: String,
    pub width: i64,
    pub height: i64,

    pub allowed: Range,

    pub colors: String,
    pub font_size: String,

    pub min: Countable,
    pub max: Countable,

    #[serde(flatten)]
    pub tally: Tally,
}

impl ScatterPlot {
    pub const LAYOUT: &'static str = "scatterplot";

    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            layout: Self::LAYOUT,
            label: String::new(),
            width: super::DEFAULT_WIDTH,
            height: super::DEFAULT_HEIGHT,
            allowed: Range::default(),
            colors: String::new(),
            font_size: String::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            tally: Tally::default(),
        }
    }

    /// Add a point. The allowed range applies to `y`.
    pub fn add(&mut self, point: Result<(Countable, Countable), ParseError>) {
        let Ok((x, y)) = point else {
            self.tally.reject();
            return;
        };
        if !self.allowed.contains(y) {
            self.tally.filter();
            return;
        }

        self.min = self.min.min(y);
        self.max = self.max.max(y);
        self.tally.accept();
        self.values.insert(format!("{}|{}", x, self.tally.count), y);
    }

    /// Parse one `"<x> <y>"` input line and add it.
    pub fn record(&mut self, raw: &[u8]) {
        self.add(decode_record(raw).and_then(parse_point));
    }
}

impl Default for ScatterPlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Bindable for ScatterPlot {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("Label", Slot::Text(&mut self.label)),
            Field::new("Width", Slot::Int(&mut self.width)),
            Field::new("Height", Slot::Int(&mut self.height)),
            Field::new("Colors", Slot::Text(&mut self.colors)),
            Field::new("FontSize", Slot::Text(&mut self.font_size)),
            Field::new("AllowedMin", Slot::Float(&mut self.allowed.min)).tagged("min"),
            Field::new("AllowedMax", Slot::Float(&mut self.allowed.max)).tagged("max"),
        ]
    }
}

fn parse_point(text: &str) -> Result<(Countable, Countable), ParseError> {
    let (x, y) = text
        .split_once(' ')
        .ok_or_else(|| ParseError::InvalidPoint(text.to_string()))?;
    Ok((parse_countable(x)?, parse_countable(y)?))
}
