//! Numeric values read from input streams, and the range filter applied to them

use serde::{Serialize, Serializer};

/// A single numeric measurement parsed from an input line.
pub type Countable = f64;

/// Error produced when a record cannot be turned into a value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("invalid point, expected \"<x> <y>\": {0:?}")]
    InvalidPoint(String),

    #[error("record is not valid UTF-8")]
    Encoding,
}

/// Parse a countable value from already-trimmed text.
pub fn parse_countable(text: &str) -> Result<Countable, ParseError> {
    text.parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))
}

/// Decode a raw record as UTF-8 and strip surrounding whitespace.
pub fn decode_record(raw: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(raw)
        .map(str::trim)
        .map_err(|_| ParseError::Encoding)
}

/// Return the histogram bucket (as a string key) that `value` falls into.
///
/// Buckets are `size` wide and aligned on zero. Negative values are shifted
/// down one bucket before truncation so that `-0.1` lands in `-size` rather
/// than sharing bucket `0` with `0.1`. Sizes below one are treated as one.
pub fn bucket_of(value: Countable, size: i64) -> String {
    let size = size.max(1);
    let shifted = if value < 0.0 { value - size as f64 } else { value };
    ((shifted as i64) / size * size).to_string()
}

/// Inclusive range of accepted values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: Countable,
    pub max: Countable,
}

impl Range {
    pub fn new(min: Countable, max: Countable) -> Self {
        Self { min, max }
    }

    /// Check whether a value lies within the range (bounds included)
    pub fn contains(&self, value: Countable) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for Range {
    fn default() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

// The range is configuration, not data: snapshots render it as `null`.
impl Serialize for Range {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_contains() {
        let range = Range::new(-1.0, 1.0);
        assert!(range.contains(0.0));
        assert!(range.contains(-1.0));
        assert!(range.contains(1.0));
        assert!(!range.contains(-1.1));
        assert!(!range.contains(1.1));
    }

    #[test]
    fn test_default_range_accepts_everything() {
        let range = Range::default();
        assert!(range.contains(f64::MAX));
        assert!(range.contains(f64::MIN));
    }

    #[test]
    fn test_range_serializes_as_null() {
        let json = serde_json::to_string(&Range::new(0.0, 1.0)).unwrap();
        assert_eq!(json, "null");
    }

    #[test]
    fn test_parse_countable() {
        assert_eq!(parse_countable("0"), Ok(0.0));
        assert_eq!(parse_countable("-100e5"), Ok(-100e5));
        assert_eq!(parse_countable("3.1415926535"), Ok(3.1415926535));
        assert!(parse_countable("3.1415a").is_err());
        assert!(parse_countable("foo").is_err());
        assert!(parse_countable("").is_err());
    }

    #[test]
    fn test_decode_record() {
        assert_eq!(decode_record(b"  4.5\r\n"), Ok("4.5"));
        assert_eq!(decode_record(&[0xff, 0xfe]), Err(ParseError::Encoding));
    }

    #[test]
    fn test_bucket_size_one() {
        assert_eq!(bucket_of(4.0, 1), "4");
        assert_eq!(bucket_of(4.9, 1), "4");
        assert_eq!(bucket_of(0.1, 1), "0");
        assert_eq!(bucket_of(-0.1, 1), "-1");
    }

    #[test]
    fn test_bucket_size_five() {
        assert_eq!(bucket_of(4.0, 5), "0");
        assert_eq!(bucket_of(4.9, 5), "0");
        assert_eq!(bucket_of(0.1, 5), "0");
        assert_eq!(bucket_of(-0.1, 5), "-5");
        assert_eq!(bucket_of(12.0, 5), "10");
    }

    #[test]
    fn test_bucket_non_positive_size_falls_back_to_one() {
        assert_eq!(bucket_of(4.9, 0), "4");
        assert_eq!(bucket_of(-0.5, -3), "-1");
    }
}
