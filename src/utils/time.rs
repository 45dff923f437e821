//! Time and timestamp utilities

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Format used by HTTP `Last-Modified` / `If-Modified-Since` headers
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Key for a time series point: RFC 3339 with nanoseconds, always UTC.
///
/// Keys have a fixed width, so lexical order is chronological order.
pub fn timestamp_key(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Format a time as an HTTP date (RFC 7231 IMF-fixdate)
pub fn http_date(when: DateTime<Utc>) -> String {
    when.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date, returning `None` for anything malformed
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Current time truncated to whole seconds, the resolution of HTTP dates
pub fn now_in_seconds() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}
