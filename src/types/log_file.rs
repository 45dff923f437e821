//! Log file: the most recent raw lines of a stream

use std::collections::BTreeMap;

use serde::Serialize;

use super::countable::{decode_record, ParseError};
use super::Tally;
use crate::bind::{Bindable, Field, Slot};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogFile {
    /// Zero-based line number to line, holding at most `window` lines
    pub values: BTreeMap<String, String>,

    pub layout: &'static str,
    pub label: String,
    /// Number of lines to retain
    pub window: i64,

    pub colors: String,
    pub font_size: String,

    #[serde(flatten)]
    pub tally: Tally,
}

impl LogFile {
    pub const LAYOUT: &'static str = "logfile";
    pub const DEFAULT_WINDOW: i64 = 1000;

    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            layout: Self::LAYOUT,
            label: String::new(),
            window: Self::DEFAULT_WINDOW,
            colors: String::new(),
            font_size: String::new(),
            tally: Tally::default(),
        }
    }

    pub fn add(&mut self, line: Result<&str, ParseError>) {
        let Ok(line) = line else {
            self.tally.reject();
            return;
        };

        self.values
            .insert(self.tally.count.to_string(), line.to_string());
        self.tally.accept();

        // Line numbers are contiguous, so anything older than the window is
        // exactly `count - window` lines back.
        let window = u64::try_from(self.window).unwrap_or(0);
        if self.values.len() as u64 > window {
            let expired = self.tally.count - window - 1;
            self.values.remove(&expired.to_string());
        }
    }

    pub fn record(&mut self, raw: &[u8]) {
        self.add(decode_record(raw));
    }
}

impl Default for LogFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Bindable for LogFile {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("Label", Slot::Text(&mut self.label)),
            Field::new("Window", Slot::Int(&mut self.window)),
            Field::new("Colors", Slot::Text(&mut self.colors)),
            Field::new("FontSize", Slot::Text(&mut self.font_size)),
        ]
    }
}
