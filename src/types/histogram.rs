//! Histogram: bucketed counts with running min/max/sum

use std::collections::BTreeMap;

use serde::Serialize;

use super::countable::{bucket_of, decode_record, parse_countable, Countable, ParseError, Range};
use super::Tally;
use crate::bind::{Bindable, Field, Slot};

/// Collects and buckets values. Stats are updated as values come in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Histogram {
    /// Bucket key to number of values that fell into it
    pub values: BTreeMap<String, u64>,

    pub layout: &'static str,
    /// Width of each bucket
    pub bucket: i64,
    pub label: String,
    /// Use the alternate wide orientation when rendering
    pub wide: bool,
    pub width: i64,
    pub height: i64,

    pub allowed: Range,

    pub colors: String,
    pub font_size: String,

    pub min: Countable,
    pub max: Countable,
    pub sum: Countable,

    #[serde(flatten)]
    pub tally: Tally,
}

impl Histogram {
    pub const LAYOUT: &'static str = "histogram";

    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            layout: Self::LAYOUT,
            bucket: 1,
            label: String::new(),
            wide: false,
            width: super::DEFAULT_WIDTH,
            height: super::DEFAULT_HEIGHT,
            allowed: Range::default(),
            colors: String::new(),
            font_size: String::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            tally: Tally::default(),
        }
    }

    /// Add a parsed value, updating stats and counts.
    pub fn add(&mut self, value: Result<Countable, ParseError>) {
        let Ok(value) = value else {
            self.tally.reject();
            return;
        };
        if !self.allowed.contains(value) {
            self.tally.filter();
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.tally.accept();
        *self.values.entry(bucket_of(value, self.bucket)).or_insert(0) += 1;
    }

    /// Parse one input line and add it.
    pub fn record(&mut self, raw: &[u8]) {
        self.add(decode_record(raw).and_then(parse_countable));
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Bindable for Histogram {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("Bucket", Slot::Int(&mut self.bucket)),
            Field::new("Label", Slot::Text(&mut self.label)),
            Field::new("Wide", Slot::Bool(&mut self.wide)),
            Field::new("Width", Slot::Int(&mut self.width)),
            Field::new("Height", Slot::Int(&mut self.height)),
            Field::new("Colors", Slot::Text(&mut self.colors)),
            Field::new("FontSize", Slot::Text(&mut self.font_size)),
            Field::new("AllowedMin", Slot::Float(&mut self.allowed.min)).tagged("min"),
            Field::new("AllowedMax", Slot::Float(&mut self.allowed.max)).tagged("max"),
        ]
    }
}
