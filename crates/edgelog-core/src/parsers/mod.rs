//! Line parsers: one per source family.
//!
//! Every parser turns a single text line into a [`ParsedLine`]. Parsers never
//! fail and never panic: a line they cannot understand comes back as
//! [`ParsedLine::default()`], which the normalizer turns into a raw-only event.
//!
//! A parser instance is created per input (see [`SourceType::parser`]) so a
//! parser may carry per-input state, such as a CSV header row.

pub mod alb;
pub mod app;
pub mod dns;
pub mod firewall;
pub mod syslog;
pub mod time;
pub mod tokenize;
pub mod web;
pub mod xff;

use crate::types::{Fields, SourceType};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub use alb::AlbParser;
pub use app::AppLogParser;
pub use dns::DnsQueryParser;
pub use firewall::FirewallParser;
pub use syslog::SyslogParser;
pub use web::WebAccessParser;

/// What a parser managed to extract from one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    /// Timestamp carried by the line itself, if one could be parsed.
    pub timestamp: Option<DateTime<Utc>>,
    pub fields: Fields,
}

impl ParsedLine {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A per-family line decoder.
pub trait LineParser: Send {
    fn source_type(&self) -> SourceType;

    /// Extract whatever structure `line` carries. Must not panic.
    fn parse(&mut self, line: &str) -> ParsedLine;
}

impl SourceType {
    /// A fresh parser for one input of this family.
    pub fn parser(&self) -> Box<dyn LineParser> {
        match self {
            SourceType::Web => Box::new(WebAccessParser),
            SourceType::Alb => Box::new(AlbParser),
            SourceType::Firewall => Box::new(FirewallParser::new()),
            SourceType::Dns => Box::new(DnsQueryParser::new()),
            SourceType::Syslog => Box::new(SyslogParser::new()),
            SourceType::App => Box::new(AppLogParser),
        }
    }
}

// ---------------------------------------------------------------------------
// Field coercion helpers
// ---------------------------------------------------------------------------

/// Parse an integer field. `-`, empty and non-numeric values are absent.
pub fn int_field(v: &str) -> Option<i64> {
    let v = v.trim();
    if v.is_empty() || v == "-" {
        return None;
    }
    v.parse().ok()
}

/// Parse a port number (0–65535).
pub fn port_field(v: &str) -> Option<u16> {
    let v = v.trim();
    if v.is_empty() || v == "-" {
        return None;
    }
    v.parse().ok()
}

/// A textual field. `-` and empty strings are placeholders, not values.
pub fn text_field(v: &str) -> Option<&str> {
    let v = v.trim();
    if v.is_empty() || v == "-" {
        None
    } else {
        Some(v)
    }
}

pub(crate) fn put_text(fields: &mut Fields, key: &str, v: &str) {
    if let Some(v) = text_field(v) {
        fields.insert(key.to_string(), Value::String(v.to_string()));
    }
}

pub(crate) fn put_int(fields: &mut Fields, key: &str, v: &str) {
    if let Some(n) = int_field(v) {
        fields.insert(key.to_string(), Value::from(n));
    }
}

pub(crate) fn put_port(fields: &mut Fields, key: &str, v: &str) {
    if let Some(p) = port_field(v) {
        fields.insert(key.to_string(), Value::from(p));
    }
}

/// Render a scalar JSON value as text for re-coercion. Objects, arrays and
/// nulls have no textual form here.
pub(crate) fn json_scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First key of `keys` present in `obj` with a scalar value.
pub(crate) fn json_first(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(|v| json_scalar(v).filter(|s| text_field(s).is_some()))
}
