//! Firewall / flow log parser.
//!
//! Flow logs arrive in one of four undeclared encodings. Each encoding has
//! its own [`EncodingDetector`]; [`FirewallParser`] asks them in a fixed
//! order and keeps the first answer:
//!
//! 1. JSON document ([`json::JsonDetector`])
//! 2. `key=value` tokens ([`kv::KeyValueDetector`])
//! 3. CEF tagged header + extension ([`cef::CefDetector`])
//! 4. comma-delimited columns ([`csv::CsvDetector`])
//!
//! A detector only *matches* when it extracts a destination port or an
//! action. JSON documents and CEF headers are unambiguous, so those detectors
//! *claim* the line even without a match, which stops later detectors from
//! finding `key=value` text inside a JSON string or a CEF name.

pub mod cef;
pub mod csv;
pub mod json;
pub mod kv;

use super::time::parse_any;
use super::{int_field, port_field, text_field, LineParser, ParsedLine};
use crate::types::SourceType;
use serde_json::Value;

/// The encodings the firewall parser understands, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowEncoding {
    Json,
    KeyValue,
    Cef,
    Csv,
}

impl FlowEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowEncoding::Json => "json",
            FlowEncoding::KeyValue => "kv",
            FlowEncoding::Cef => "cef",
            FlowEncoding::Csv => "csv",
        }
    }
}

/// Outcome of one detector on one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// Extracted a destination port or an action.
    Match(ParsedLine),
    /// The line is unambiguously this encoding but carried no flow verdict.
    /// What was extracted is kept; no other detector is tried.
    Claimed(ParsedLine),
    /// Not this encoding, or nothing useful; try the next detector.
    Miss,
}

/// A single-encoding detector. Detectors may keep per-input state.
pub trait EncodingDetector: Send {
    fn encoding(&self) -> FlowEncoding;
    fn detect(&mut self, line: &str) -> Detection;
}

pub struct FirewallParser {
    detectors: Vec<Box<dyn EncodingDetector>>,
}

impl FirewallParser {
    pub fn new() -> Self {
        Self::with_detectors(vec![
            Box::new(json::JsonDetector),
            Box::new(kv::KeyValueDetector),
            Box::new(cef::CefDetector),
            Box::new(csv::CsvDetector::new()),
        ])
    }

    /// A parser with a custom detector chain, tried in the given order.
    pub fn with_detectors(detectors: Vec<Box<dyn EncodingDetector>>) -> Self {
        Self { detectors }
    }

    /// Run the chain and report which encoding answered.
    pub fn detect(&mut self, line: &str) -> Option<(FlowEncoding, ParsedLine)> {
        for detector in self.detectors.iter_mut() {
            match detector.detect(line) {
                Detection::Match(p) | Detection::Claimed(p) => {
                    return Some((detector.encoding(), p));
                }
                Detection::Miss => {}
            }
        }
        None
    }
}

impl Default for FirewallParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser for FirewallParser {
    fn source_type(&self) -> SourceType {
        SourceType::Firewall
    }

    fn parse(&mut self, line: &str) -> ParsedLine {
        match self.detect(line.trim()) {
            Some((encoding, mut parsed)) => {
                if !parsed.fields.is_empty() {
                    parsed
                        .fields
                        .insert("encoding".to_string(), Value::from(encoding.as_str()));
                }
                parsed
            }
            None => ParsedLine::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared flow vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowKind {
    Addr,
    Port,
    Int,
    Text,
    Action,
    Time,
}

/// A normalised flow key and the vendor spellings that map onto it.
struct FlowKey {
    key: &'static str,
    aliases: &'static [&'static str],
    kind: FlowKind,
}

const FLOW_KEYS: &[FlowKey] = &[
    FlowKey {
        key: "src",
        aliases: &["src", "src_ip", "srcip", "source", "sourceip", "source_ip", "saddr", "srcaddr", "client_ip", "source.ip"],
        kind: FlowKind::Addr,
    },
    FlowKey {
        key: "dst",
        aliases: &["dst", "dst_ip", "dstip", "destination", "destinationip", "destination_ip", "daddr", "dstaddr", "server_ip", "destination.ip"],
        kind: FlowKind::Addr,
    },
    FlowKey {
        key: "spt",
        aliases: &["spt", "sport", "srcport", "src_port", "sourceport", "source_port", "source.port"],
        kind: FlowKind::Port,
    },
    FlowKey {
        key: "dpt",
        aliases: &["dpt", "dport", "dstport", "dst_port", "destinationport", "destination_port", "destination.port"],
        kind: FlowKind::Port,
    },
    FlowKey {
        key: "proto",
        aliases: &["proto", "protocol", "transport", "network.transport"],
        kind: FlowKind::Text,
    },
    FlowKey {
        key: "action",
        aliases: &["action", "act", "decision", "rule_action", "verdict", "disposition", "event.action"],
        kind: FlowKind::Action,
    },
    FlowKey {
        key: "bytes",
        aliases: &["bytes", "bytes_total", "sentbytes", "bytes_sent", "bytes_out"],
        kind: FlowKind::Int,
    },
    FlowKey {
        key: "time",
        aliases: &["ts", "time", "timestamp", "@timestamp", "rt", "date", "start"],
        kind: FlowKind::Time,
    },
];

/// True when `name` (already lowercase) is a known vendor spelling.
pub(crate) fn is_flow_alias(name: &str) -> bool {
    canonical_key(name).is_some()
}

/// The normalised key for a vendor spelling, if known.
pub(crate) fn canonical_key(name: &str) -> Option<&'static str> {
    FLOW_KEYS
        .iter()
        .find(|k| k.aliases.contains(&name))
        .map(|k| k.key)
}

/// Build a [`ParsedLine`] by probing `lookup` with every alias, in table
/// order. `lookup` receives lowercase alias names. An alias whose value is a
/// placeholder or does not coerce gives way to the next alias.
pub(crate) fn flow_fields<F>(lookup: F) -> ParsedLine
where
    F: Fn(&str) -> Option<String>,
{
    let mut parsed = ParsedLine::default();
    for flow_key in FLOW_KEYS {
        for value in flow_key.aliases.iter().filter_map(|&a| lookup(a)) {
            if put_flow_value(&mut parsed, flow_key, &value) {
                break;
            }
        }
    }
    parsed
}

/// Store `value` under `flow_key` if it coerces. Returns whether it did.
fn put_flow_value(parsed: &mut ParsedLine, flow_key: &FlowKey, value: &str) -> bool {
    let key = flow_key.key.to_string();
    let coerced = match flow_key.kind {
        FlowKind::Addr | FlowKind::Text => text_field(value).map(Value::from),
        FlowKind::Port => port_field(value).map(Value::from),
        FlowKind::Int => int_field(value).map(Value::from),
        FlowKind::Action => normalize_action(value).map(Value::String),
        FlowKind::Time => {
            parsed.timestamp = parse_any(value);
            return parsed.timestamp.is_some();
        }
    };
    match coerced {
        Some(v) => {
            parsed.fields.insert(key, v);
            true
        }
        None => false,
    }
}

/// A flow verdict was extracted: destination port or action.
pub(crate) fn has_verdict(parsed: &ParsedLine) -> bool {
    parsed.fields.contains_key("dpt") || parsed.fields.contains_key("action")
}

/// Map vendor action words onto `allow` / `deny`. Unrecognised actions are
/// kept, lowercased.
pub fn normalize_action(s: &str) -> Option<String> {
    let lower = s.trim().trim_matches('"').to_ascii_lowercase();
    if lower.is_empty() || lower == "-" {
        return None;
    }
    let mapped = match lower.as_str() {
        "allow" | "allowed" | "accept" | "accepted" | "permit" | "permitted" | "pass" => "allow",
        "deny" | "denied" | "drop" | "dropped" | "block" | "blocked" | "reject" | "rejected" => "deny",
        other if other.contains("allow") || other.contains("accept") => "allow",
        other if other.contains("deny") || other.contains("drop") || other.contains("block") => "deny",
        other => return Some(other.to_string()),
    };
    Some(mapped.to_string())
}
