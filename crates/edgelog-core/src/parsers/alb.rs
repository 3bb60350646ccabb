//! AWS Application Load Balancer access log parser.
//!
//! ALB entries are space-delimited with a handful of double-quoted fields and
//! a documented, stable column order, so fields are read positionally. The
//! order lives in [`ALB_COLUMNS`]; when AWS appends columns, that table is the
//! only thing that changes.
//!
//! ```text
//! http 2015-05-13T23:39:43.945958Z app/my-lb/50dc6c495c0c9188 192.0.2.10:2817 10.0.0.1:80 0.000 0.026 0.000 200 200 0 57 "GET http://www.example.com:80/ HTTP/1.1" "curl/7.38.0" - - ...
//! ```

use super::time::parse_any;
use super::tokenize::{tokenize_with, unescape, TokenizeOptions};
use super::web::split_request;
use super::{json_first, put_int, put_port, put_text, LineParser, ParsedLine};
use crate::types::{Fields, SourceType};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// How one positional column is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    /// The entry's timestamp.
    Time,
    /// `address:port`, written to the two named field keys.
    Endpoint { addr: &'static str, port: &'static str },
    /// Elapsed seconds; `-1` means not measured.
    Seconds,
    /// `"METHOD URL PROTOCOL"`.
    Request,
    /// Documented but not carried into `fields`.
    Ignore,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Name used in the AWS documentation.
    pub name: &'static str,
    /// Key written into `fields`.
    pub key: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, key: &'static str, kind: ColumnKind) -> Column {
    Column { name, key, kind }
}

pub const ALB_COLUMNS: &[Column] = &[
    col("type", "type", ColumnKind::Text),
    col("time", "time", ColumnKind::Time),
    col("elb", "elb", ColumnKind::Text),
    col("client:port", "src", ColumnKind::Endpoint { addr: "src", port: "spt" }),
    col("target:port", "dst", ColumnKind::Endpoint { addr: "dst", port: "dpt" }),
    col("request_processing_time", "request_processing_time", ColumnKind::Seconds),
    col("target_processing_time", "target_processing_time", ColumnKind::Seconds),
    col("response_processing_time", "response_processing_time", ColumnKind::Seconds),
    col("elb_status_code", "status", ColumnKind::Int),
    col("target_status_code", "target_status", ColumnKind::Int),
    col("received_bytes", "received_bytes", ColumnKind::Int),
    col("sent_bytes", "bytes", ColumnKind::Int),
    col("request", "request", ColumnKind::Request),
    col("user_agent", "user_agent", ColumnKind::Text),
    col("ssl_cipher", "ssl_cipher", ColumnKind::Text),
    col("ssl_protocol", "ssl_protocol", ColumnKind::Text),
    col("target_group_arn", "target_group_arn", ColumnKind::Text),
    col("trace_id", "trace_id", ColumnKind::Text),
    col("domain_name", "domain_name", ColumnKind::Text),
    col("chosen_cert_arn", "chosen_cert_arn", ColumnKind::Ignore),
    col("matched_rule_priority", "matched_rule_priority", ColumnKind::Int),
    col("request_creation_time", "request_creation_time", ColumnKind::Ignore),
    col("actions_executed", "actions_executed", ColumnKind::Text),
    col("redirect_url", "redirect_url", ColumnKind::Text),
    col("error_reason", "error_reason", ColumnKind::Text),
    col("target:port_list", "target_list", ColumnKind::Ignore),
    col("target_status_code_list", "target_status_list", ColumnKind::Ignore),
    col("classification", "classification", ColumnKind::Text),
    col("classification_reason", "classification_reason", ColumnKind::Text),
];

/// Columns up to and including `sent_bytes` must be present.
pub const REQUIRED_COLUMNS: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct AlbParser;

impl LineParser for AlbParser {
    fn source_type(&self) -> SourceType {
        SourceType::Alb
    }

    fn parse(&mut self, line: &str) -> ParsedLine {
        let trimmed = line.trim();
        if trimmed.starts_with('{') {
            if let Some(parsed) = parse_json(trimmed) {
                return parsed;
            }
        }
        parse_positional(trimmed).unwrap_or_default()
    }
}

/// Split `address:port` from the right so IPv6 literals keep their colons.
/// `[v6]:port` brackets are stripped. `-` means no endpoint.
pub fn split_host_port(s: &str) -> Option<(&str, Option<&str>)> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    if let Some(rest) = s.strip_prefix('[') {
        let (addr, after) = rest.split_once(']')?;
        let port = after.strip_prefix(':').filter(|p| !p.is_empty());
        return Some((addr, port));
    }
    match s.rsplit_once(':') {
        Some((addr, port)) if !addr.is_empty() => Some((addr, Some(port))),
        _ => Some((s, None)),
    }
}

fn parse_positional(line: &str) -> Option<ParsedLine> {
    let tokens = tokenize_with(line, TokenizeOptions { brackets: false }).ok()?;
    if tokens.len() < REQUIRED_COLUMNS {
        return None;
    }

    let mut fields = Fields::new();
    let mut timestamp = None;

    for (column, token) in ALB_COLUMNS.iter().zip(tokens.iter()) {
        let value = unescape(token.text());
        decode_column(column, &value, &mut fields, &mut timestamp);
    }

    // A required column that decodes to nothing is fine; a line whose time
    // is not a time is not an ALB entry.
    if timestamp.is_none() {
        return None;
    }
    Some(ParsedLine { timestamp, fields })
}

fn decode_column(
    column: &Column,
    value: &str,
    fields: &mut Fields,
    timestamp: &mut Option<DateTime<Utc>>,
) {
    match column.kind {
        ColumnKind::Text => put_text(fields, column.key, value),
        ColumnKind::Int => put_int(fields, column.key, value),
        ColumnKind::Time => *timestamp = parse_any(value),
        ColumnKind::Endpoint { addr, port } => {
            if let Some((a, p)) = split_host_port(value) {
                put_text(fields, addr, a);
                if let Some(p) = p {
                    put_port(fields, port, p);
                }
            }
        }
        ColumnKind::Seconds => {
            if let Ok(secs) = value.trim().parse::<f64>() {
                if secs >= 0.0 && secs.is_finite() {
                    fields.insert(column.key.to_string(), Value::from(secs));
                }
            }
        }
        ColumnKind::Request => decode_request(value, fields),
        ColumnKind::Ignore => {}
    }
}

fn decode_request(request: &str, fields: &mut Fields) {
    let Some((method, url, protocol)) = split_request(request) else {
        return;
    };
    put_text(fields, "method", method);
    let (host, path) = split_url(url);
    if let Some(host) = host {
        put_text(fields, "host", host);
    }
    put_text(fields, "path", path);
    if let Some(protocol) = protocol {
        put_text(fields, "protocol", protocol);
    }
}

/// `http://host:port/p?q` → (`host:port`, `/p?q`). Relative URLs have no host.
fn split_url(url: &str) -> (Option<&str>, &str) {
    let Some((_, rest)) = url.split_once("://") else {
        return (None, url);
    };
    match rest.find('/') {
        Some(i) => (Some(&rest[..i]), &rest[i..]),
        None => (Some(rest), "/"),
    }
}

/// Lines already normalised by an upstream tool.
fn parse_json(line: &str) -> Option<ParsedLine> {
    let obj: serde_json::Map<String, Value> = serde_json::from_str(line).ok()?;
    let mut fields = Fields::new();

    for (key, synonyms) in [
        ("src", &["src_ip", "client_ip", "src"][..]),
        ("method", &["method"][..]),
        ("path", &["object", "path"][..]),
        ("host", &["host"][..]),
        ("user_agent", &["ua", "user_agent"][..]),
    ] {
        if let Some(v) = json_first(&obj, synonyms) {
            put_text(&mut fields, key, &v);
        }
    }
    for (key, synonyms) in [("status", &["status", "elb_status_code"][..]), ("bytes", &["bytes", "sent_bytes"][..])] {
        if let Some(v) = json_first(&obj, synonyms) {
            put_int(&mut fields, key, &v);
        }
    }

    let timestamp = json_first(&obj, &["ts", "time", "@timestamp"]).and_then(|t| parse_any(&t));
    Some(ParsedLine { timestamp, fields })
}
