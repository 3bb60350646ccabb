//! Domain-specific assertion macros for edgelog harnesses.
//!
//! These add context-rich failure messages that make it clear *which*
//! event and *which* field broke, including the raw line it came from.

use edgelog_core::{NormalizedEvent, TimeSource};

// ---------------------------------------------------------------------------
// Field assertions
// ---------------------------------------------------------------------------

/// Assert that a `NormalizedEvent` has a specific field with an expected value.
///
/// ```rust
/// assert_has_field!(event, "status", 200);
/// ```
#[macro_export]
macro_rules! assert_has_field {
    ($event:expr, $key:expr, $value:expr) => {{
        let event: &edgelog_core::NormalizedEvent = &$event;
        let key: &str = $key;
        let expected = serde_json::json!($value);
        match event.fields.get(key) {
            Some(actual) if *actual == expected => {}
            Some(actual) => panic!(
                "assert_has_field! failed:\n  event.fields[{:?}]\n  expected: {}\n  actual:   {}\n  raw: {:?}",
                key, expected, actual, event.raw
            ),
            None => panic!(
                "assert_has_field! failed: field {:?} not found.\n  Available fields: {:?}\n  raw: {:?}",
                key,
                event.fields.keys().collect::<Vec<_>>(),
                event.raw
            ),
        }
    }};
}

/// Assert that a `NormalizedEvent` does not carry a field.
#[macro_export]
macro_rules! assert_no_field {
    ($event:expr, $key:expr) => {{
        let event: &edgelog_core::NormalizedEvent = &$event;
        let key: &str = $key;
        if let Some(actual) = event.fields.get(key) {
            panic!(
                "assert_no_field! failed: {:?} = {}\n  raw: {:?}",
                key, actual, event.raw
            );
        }
    }};
}

/// Assert that a `NormalizedEvent` is raw-only: no structured fields.
#[macro_export]
macro_rules! assert_raw_only {
    ($event:expr) => {{
        let event: &edgelog_core::NormalizedEvent = &$event;
        if !event.is_raw_only() {
            panic!(
                "assert_raw_only! failed: fields {:?}\n  raw: {:?}",
                event.fields, event.raw
            );
        }
    }};
}

// ---------------------------------------------------------------------------
// Output file assertions
// ---------------------------------------------------------------------------

/// Assert that every JSON value in a JSONL output satisfies a predicate.
///
/// ```rust
/// assert_lines_all!(lines, |v| v["asset"] == "edge-01");
/// ```
#[macro_export]
macro_rules! assert_lines_all {
    ($lines:expr, $pred:expr) => {{
        let lines: &[serde_json::Value] = &$lines;
        let pred = $pred;
        let failing: Vec<_> = lines.iter().filter(|v| !pred(v)).collect();
        if !failing.is_empty() {
            panic!(
                "assert_lines_all! failed: {} of {} lines did not satisfy predicate.\n  first: {}",
                failing.len(),
                lines.len(),
                failing[0]
            );
        }
    }};
}

// ---------------------------------------------------------------------------
// Event invariant helpers
// ---------------------------------------------------------------------------

/// Every event, whatever the parser made of it, keeps its raw line and carries
/// the run's asset and a timestamp.
pub fn assert_event_invariants(event: &NormalizedEvent, raw: &str, asset: &str) {
    assert_eq!(event.raw, raw, "raw must be the input line unchanged");
    assert_eq!(event.asset, asset, "asset must be stamped on every event: {:?}", event.raw);
    if event.timestamp.source == TimeSource::Line {
        assert!(
            event.timestamp.at.timestamp() > 0,
            "line timestamp should not be the Unix epoch: {:?}",
            event.raw
        );
    }
}
