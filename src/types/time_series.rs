//! Time series: timestamped values over a sliding window

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::countable::{decode_record, parse_countable, Countable, ParseError, Range};
use super::Tally;
use crate::bind::{Bindable, Field, Slot};
use crate::utils::time::timestamp_key;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeSeries {
    /// Timestamp key to value, holding at most `window` entries
    pub values: BTreeMap<String, Countable>,
    #[serde(skip)]
    times: VecDeque<String>,

    pub layout: &'static str,
    pub label: String,
    pub width: i64,
    pub height: i64,
    /// Number of points to retain
    pub window: i64,

    pub allowed: Range,

    pub colors: String,
    pub font_size: String,

    pub min: Countable,
    pub max: Countable,

    #[serde(flatten)]
    pub tally: Tally,
}

impl TimeSeries {
    pub const LAYOUT: &'static str = "time-series";
    pub const DEFAULT_WINDOW: i64 = 100;

    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            times: VecDeque::new(),
            layout: Self::LAYOUT,
            label: String::new(),
            width: super::DEFAULT_WIDTH,
            height: super::DEFAULT_HEIGHT,
            window: Self::DEFAULT_WINDOW,
            allowed: Range::default(),
            colors: String::new(),
            font_size: String::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            tally: Tally::default(),
        }
    }

    /// Add a value observed at `when`, evicting the oldest points beyond the window.
    pub fn add(&mut self, when: DateTime<Utc>, value: Result<Countable, ParseError>) {
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
        self.tally.accept();

        let key = timestamp_key(when);
        if self.values.insert(key.clone(), value).is_none() {
            self.times.push_back(key);
        }

        let window = usize::try_from(self.window).unwrap_or(0);
        while self.times.len() > window {
            if let Some(oldest) = self.times.pop_front() {
                self.values.remove(&oldest);
            }
        }
    }

    /// Parse one input line and add it, timestamped now.
    pub fn record(&mut self, raw: &[u8]) {
        self.add(Utc::now(), decode_record(raw).and_then(parse_countable));
    }
}

impl Default for TimeSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl Bindable for TimeSeries {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("Label", Slot::Text(&mut self.label)),
            Field::new("Width", Slot::Int(&mut self.width)),
            Field::new("Height", Slot::Int(&mut self.height)),
            Field::new("Window", Slot::Int(&mut self.window)),
            Field::new("Colors", Slot::Text(&mut self.colors)),
            Field::new("FontSize", Slot::Text(&mut self.font_size)),
            Field::new("AllowedMin", Slot::Float(&mut self.allowed.min)).tagged("min"),
            Field::new("AllowedMax", Slot::Float(&mut self.allowed.max)).tagged("max"),
        ]
    }
}
