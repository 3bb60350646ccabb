//! Web access log parser (nginx / Apache common and combined formats).
//!
//! ```text
//! host ident user [time_local] "request" status bytes ["referer" "user-agent" ["x-forwarded-for"]]
//! ```
//!
//! Lines written with nginx `log_format ... escape=json` are accepted as well.

use super::time::{parse_access_time, parse_any};
use super::tokenize::{tokenize, unescape, Token};
use super::{json_first, put_int, put_text, xff, LineParser, ParsedLine};
use crate::types::{Fields, SourceType};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebAccessParser;

impl LineParser for WebAccessParser {
    fn source_type(&self) -> SourceType {
        SourceType::Web
    }

    fn parse(&mut self, line: &str) -> ParsedLine {
        if line.trim_start().starts_with('{') {
            if let Some(parsed) = parse_json(line) {
                return parsed;
            }
        }
        parse_combined(line).unwrap_or_default()
    }
}

/// Method, path and (optional) protocol from a request line. Fewer than two
/// parts means the request is malformed.
pub fn split_request(request: &str) -> Option<(&str, &str, Option<&str>)> {
    let mut parts = request.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    Some((method, path, parts.last()))
}

fn parse_combined(line: &str) -> Option<ParsedLine> {
    let tokens = tokenize(line).ok()?;

    let [Token::Bare(host), Token::Bare(_ident), Token::Bare(user), Token::Bracketed(time), Token::Quoted(request), Token::Bare(status), Token::Bare(bytes), rest @ ..] =
        tokens.as_slice()
    else {
        return None;
    };

    let request = unescape(request);
    let (method, path, protocol) = split_request(&request)?;

    let mut fields = Fields::new();
    put_text(&mut fields, "src", host);
    put_text(&mut fields, "user", user);
    put_text(&mut fields, "method", method);
    put_text(&mut fields, "path", path);
    if let Some(protocol) = protocol {
        put_text(&mut fields, "protocol", protocol);
    }
    put_int(&mut fields, "status", status);
    put_int(&mut fields, "bytes", bytes);

    let quoted: Vec<_> = rest
        .iter()
        .map_while(|t| match t {
            Token::Quoted(s) => Some(unescape(s)),
            _ => None,
        })
        .collect();
    if let Some(referrer) = quoted.first() {
        put_text(&mut fields, "referrer", referrer);
    }
    if let Some(ua) = quoted.get(1) {
        put_text(&mut fields, "user_agent", ua);
    }
    if let Some(forwarded) = quoted.get(2) {
        put_forwarded(&mut fields, host, forwarded);
    }

    Some(ParsedLine {
        timestamp: parse_access_time(time),
        fields,
    })
}

fn put_forwarded(fields: &mut Fields, src: &str, forwarded: &str) {
    put_text(fields, "forwarded_for", forwarded);
    if fields.contains_key("forwarded_for") {
        let src = super::text_field(src);
        if let Some(client) = xff::pick_client_ip(src, Some(forwarded)) {
            fields.insert("client_ip".to_string(), Value::String(client));
        }
    }
}

fn parse_json(line: &str) -> Option<ParsedLine> {
    let obj: serde_json::Map<String, Value> = serde_json::from_str(line).ok()?;
    let mut fields = Fields::new();

    let src = json_first(&obj, &["remote_addr", "src_ip", "client_ip", "src"]);
    if let Some(src) = &src {
        put_text(&mut fields, "src", src);
    }

    let mut method = json_first(&obj, &["method", "request_method"]);
    let mut path = json_first(&obj, &["uri", "path", "request_uri"]);
    let mut protocol = json_first(&obj, &["protocol", "server_protocol"]);
    if let Some(request) = json_first(&obj, &["request", "req"]) {
        if let Some((m, p, proto)) = split_request(&request) {
            method.get_or_insert_with(|| m.to_string());
            path.get_or_insert_with(|| p.to_string());
            if let Some(proto) = proto {
                protocol.get_or_insert_with(|| proto.to_string());
            }
        }
    }
    for (key, value) in [("method", &method), ("path", &path), ("protocol", &protocol)] {
        if let Some(v) = value {
            put_text(&mut fields, key, v);
        }
    }

    for (key, synonyms) in [
        ("status", &["status"][..]),
        ("bytes", &["bytes", "body_bytes_sent", "bytes_sent"][..]),
    ] {
        if let Some(v) = json_first(&obj, synonyms) {
            put_int(&mut fields, key, &v);
        }
    }
    for (key, synonyms) in [
        ("user", &["remote_user", "user"][..]),
        ("referrer", &["http_referer", "referrer", "referer"][..]),
        ("user_agent", &["http_user_agent", "user_agent", "ua"][..]),
    ] {
        if let Some(v) = json_first(&obj, synonyms) {
            put_text(&mut fields, key, &v);
        }
    }
    if let Some(forwarded) = json_first(&obj, &["http_x_forwarded_for", "xff", "x_forwarded_for"]) {
        put_forwarded(&mut fields, src.as_deref().unwrap_or("-"), &forwarded);
    }

    let timestamp = json_first(&obj, &["time", "ts", "@timestamp", "time_iso8601", "time_local"])
        .and_then(|t| parse_any(&t));

    Some(ParsedLine { timestamp, fields })
}
