//! Normalizer: turns parser output into [`NormalizedEvent`] values.
//!
//! Normalisation never fails. A line the parser could not structure still
//! becomes an event: `raw` is kept, `fields` is empty. A line without a
//! usable timestamp gets the run's fallback time, marked as such.

use crate::parsers::ParsedLine;
use crate::types::{EventTime, NormalizedEvent, SourceType};
use chrono::{DateTime, Utc};

/// Stamps parser output with the per-run constants (asset, fallback time).
#[derive(Debug, Clone)]
pub struct EventFactory {
    asset: String,
    fallback_time: DateTime<Utc>,
}

impl EventFactory {
    /// Uses the current time as the fallback for lines without a timestamp.
    pub fn new(asset: impl Into<String>) -> Self {
        Self::with_fallback_time(asset, Utc::now())
    }

    pub fn with_fallback_time(asset: impl Into<String>, fallback_time: DateTime<Utc>) -> Self {
        Self {
            asset: asset.into(),
            fallback_time,
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn fallback_time(&self) -> DateTime<Utc> {
        self.fallback_time
    }

    pub fn normalize(&self, source_type: SourceType, raw_line: &str, parsed: ParsedLine) -> NormalizedEvent {
        let timestamp = match parsed.timestamp {
            Some(at) => EventTime::from_line(at),
            None => EventTime::fallback(self.fallback_time),
        };
        NormalizedEvent {
            timestamp,
            asset: self.asset.clone(),
            source_type,
            fields: parsed.fields,
            raw: raw_line.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::LineParser;
    use crate::types::TimeSource;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn factory() -> EventFactory {
        EventFactory::with_fallback_time("edge-01", Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn empty_parse_is_a_raw_only_event() {
        let event = factory().normalize(SourceType::Firewall, "??", ParsedLine::default());
        assert!(event.is_raw_only());
        assert_eq!(event.raw, "??");
        assert_eq!(event.asset, "edge-01");
        assert_eq!(event.timestamp.source, TimeSource::Fallback);
        assert_eq!(event.timestamp.at, factory().fallback_time());
    }

    #[test]
    fn line_timestamp_wins_over_fallback() {
        let line = r#"127.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET /x HTTP/1.1" 200 1234"#;
        let parsed = SourceType::Web.parser().parse(line);
        let event = factory().normalize(SourceType::Web, line, parsed);
        assert_eq!(event.timestamp.source, TimeSource::Line);
        assert_eq!(event.timestamp.at.to_rfc3339(), "2023-10-10T20:55:36+00:00");
        assert_eq!(event.raw, line);
    }
}
