//! Timestamp helpers shared by the parsers. All results are UTC.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static ISO_IN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?")
        .expect("valid regex")
});

/// Access-log `time_local`: `10/Oct/2023:13:55:36 -0700`.
pub fn parse_access_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_str(s.trim(), "%d/%b/%Y:%H:%M:%S %z")
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// RFC 3339 / ISO 8601 with an offset, or a naive ISO datetime taken as UTC.
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&n));
        }
    }
    None
}

/// Unix epoch seconds, or milliseconds when the value is too large to be
/// seconds (CEF `rt`, many flow exporters).
pub fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    let n: i64 = s.trim().parse().ok()?;
    if n <= 0 {
        return None;
    }
    if n >= 100_000_000_000 {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

/// The first ISO 8601 timestamp found anywhere in `text`.
pub fn find_iso(text: &str) -> Option<DateTime<Utc>> {
    ISO_IN_TEXT_RE
        .find_iter(text)
        .find_map(|m| parse_iso(m.as_str()))
}

/// BIND query log time: `15-Jan-2024 10:00:00.123`, local time taken as UTC.
pub fn parse_bind_time(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), "%d-%b-%Y %H:%M:%S%.f")
        .ok()
        .map(|n| Utc.from_utc_datetime(&n))
}

/// RFC 3164 syslog stamp (`Jan 15 10:00:00`, day possibly space padded).
///
/// The stamp has no year. It is placed in `reference`'s year unless that
/// lands more than a day after `reference`, in which case it belongs to the
/// year before (a December line read in January).
pub fn parse_rfc3164(stamp: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let stamp = stamp.split_whitespace().collect::<Vec<_>>().join(" ");
    let in_year = |year: i32| {
        NaiveDateTime::parse_from_str(&format!("{year} {stamp}"), "%Y %b %d %H:%M:%S")
            .ok()
            .map(|n| Utc.from_utc_datetime(&n))
    };
    match in_year(reference.year()) {
        Some(t) if t - reference <= Duration::days(1) => Some(t),
        _ => in_year(reference.year() - 1),
    }
}

/// Any of the above, tried in order.
pub fn parse_any(s: &str) -> Option<DateTime<Utc>> {
    parse_iso(s)
        .or_else(|| parse_access_time(s))
        .or_else(|| parse_epoch(s))
}
