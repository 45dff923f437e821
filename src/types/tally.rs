//! Counters shared by every graph kind

use serde::Serialize;

/// Accepted, filtered and rejected record counts
///
/// `count` doubles as the graph's change indicator: it only ever grows, so a
/// caller that remembers the last value it saw can tell whether anything new
/// was accepted since.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tally {
    /// Records accepted into the graph
    pub count: u64,
    /// Records dropped for falling outside the allowed range
    pub filtered: u64,
    /// Records skipped because they could not be read or parsed
    pub errors: u64,
}

impl Tally {
    /// Report whether anything was accepted after `since`.
    ///
    /// Returns `(false, since)` when nothing changed, otherwise `(true, count)`.
    pub fn changed(&self, since: u64) -> (bool, u64) {
        if self.count <= since {
            (false, since)
        } else {
            (true, self.count)
        }
    }

    pub(crate) fn accept(&mut self) {
        self.count += 1;
    }

    pub(crate) fn filter(&mut self) {
        self.filtered += 1;
    }

    pub(crate) fn reject(&mut self) {
        self.errors += 1;
    }
}
