//! Generic syslog files (`/var/log/syslog`, `messages`, `auth.log`, `secure`).
//!
//! The header (`Jan 15 10:00:00 host prog[pid]: ` or the rsyslog ISO form) is
//! always read. The message is then classified, first match wins:
//!
//! 1. `network_flow`: `key=value` pairs naming both a source and a destination
//! 2. `dns`: a resolver query line, or a loose query mention with a name
//! 3. `auth`: login success or failure phrases
//!
//! Anything else keeps only the header fields.

use super::dns::{self, clean_qname};
use super::firewall::{flow_fields, is_flow_alias, kv::scan_pairs};
use super::time::{find_iso, parse_iso, parse_rfc3164};
use super::{put_int, put_text, LineParser, ParsedLine};
use crate::types::{Fields, SourceType};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

static RFC3164_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:<\d{1,3}>)?(?P<stamp>[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(?P<host>\S+)\s+(?P<rest>.*)$",
    )
    .expect("valid regex")
});

static ISO_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<\d{1,3}>)?(?P<stamp>\d{4}-\d{2}-\d{2}T\S+)\s+(?P<host>\S+)\s+(?P<rest>.*)$")
        .expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<program>[A-Za-z0-9_./-]+?)(?:\[(?P<pid>\d+)\])?:\s*(?P<msg>.*)$")
        .expect("valid regex")
});

static IPV4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid regex")
});

static DNS_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:query|question)\b").expect("valid regex")
});

static QNAME_CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9_-]{1,63}(?:\.[A-Za-z0-9_-]{1,63}){1,10}\b").expect("valid regex")
});

static AUTH_OK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:accepted password|accepted publickey|authentication succeeded|logged in|login succeeded)\b")
        .expect("valid regex")
});

static AUTH_FAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:failed password|invalid user|authentication failure|login failed)\b")
        .expect("valid regex")
});

static AUTH_USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfor (?:invalid user )?(?P<user>[A-Za-z0-9._@-]+) from\b").expect("valid regex")
});

/// The parts of a syslog line before the message.
#[derive(Debug, Clone, PartialEq)]
pub struct SyslogHeader<'a> {
    pub timestamp: Option<DateTime<Utc>>,
    pub host: &'a str,
    pub program: Option<&'a str>,
    pub pid: Option<&'a str>,
    pub message: &'a str,
}

impl<'a> SyslogHeader<'a> {
    /// Split a BSD (`Jan 15 10:00:00`) or ISO-stamped syslog line. `reference`
    /// supplies the year BSD stamps leave out.
    pub fn parse(line: &'a str, reference: DateTime<Utc>) -> Option<Self> {
        let (caps, timestamp) = if let Some(caps) = RFC3164_RE.captures(line) {
            let ts = parse_rfc3164(&caps["stamp"], reference);
            (caps, ts)
        } else {
            let caps = ISO_HEADER_RE.captures(line)?;
            let ts = parse_iso(&caps["stamp"])?;
            (caps, Some(ts))
        };
        let host = caps.name("host")?.as_str();
        let rest = caps.name("rest")?.as_str();

        let (program, pid, message) = match TAG_RE.captures(rest) {
            Some(tag) => (
                tag.name("program").map(|m| m.as_str()),
                tag.name("pid").map(|m| m.as_str()),
                tag.name("msg").map_or("", |m| m.as_str()),
            ),
            None => (None, None, rest),
        };
        Some(Self {
            timestamp,
            host,
            program,
            pid,
            message,
        })
    }
}

/// First valid IPv4 address in `text`.
pub(crate) fn first_ipv4(text: &str) -> Option<Ipv4Addr> {
    IPV4_RE.find_iter(text).find_map(|m| m.as_str().parse().ok())
}

/// Flow fields when the message names both ends of a connection.
fn network_flow(message: &str) -> Option<Fields> {
    let mut known: HashMap<String, String> = HashMap::new();
    for (k, v) in scan_pairs(message) {
        if is_flow_alias(&k) {
            known.entry(k).or_insert(v);
        }
    }
    let parsed = flow_fields(|k| known.get(k).cloned());
    if !(parsed.fields.contains_key("src") && parsed.fields.contains_key("dst")) {
        return None;
    }
    // The header owns the event time; a `time=` pair is not used.
    Some(parsed.fields)
}

fn dns_query(message: &str) -> Option<Fields> {
    let mut fields = Fields::new();
    if let Some(query) = dns::find_query(message) {
        query.write_fields(&mut fields);
        return Some(fields);
    }
    if !DNS_HINT_RE.is_match(message) {
        return None;
    }
    let qname = QNAME_CANDIDATE_RE
        .find_iter(message)
        .map(|m| m.as_str())
        .filter(|c| !c.eq_ignore_ascii_case("localhost") && c.parse::<Ipv4Addr>().is_err())
        .find_map(clean_qname)?;
    if let Some(ip) = first_ipv4(message) {
        fields.insert("src".to_string(), Value::String(ip.to_string()));
    }
    fields.insert("query".to_string(), Value::String(qname));
    Some(fields)
}

fn auth(message: &str) -> Option<Fields> {
    let result = if AUTH_FAIL_RE.is_match(message) {
        "fail"
    } else if AUTH_OK_RE.is_match(message) {
        "success"
    } else {
        return None;
    };
    let mut fields = Fields::new();
    fields.insert("result".to_string(), Value::from(result));
    if let Some(ip) = first_ipv4(message) {
        fields.insert("src".to_string(), Value::String(ip.to_string()));
    }
    if let Some(user) = AUTH_USER_RE.captures(message) {
        put_text(&mut fields, "user", &user["user"]);
    }
    Some(fields)
}

/// Category and fields for a syslog message body.
pub fn classify(message: &str) -> Option<(&'static str, Fields)> {
    network_flow(message)
        .map(|f| ("network_flow", f))
        .or_else(|| dns_query(message).map(|f| ("dns", f)))
        .or_else(|| auth(message).map(|f| ("auth", f)))
}

#[derive(Debug, Clone, Copy)]
pub struct SyslogParser {
    reference: DateTime<Utc>,
}

impl SyslogParser {
    pub fn new() -> Self {
        Self::with_reference(Utc::now())
    }

    /// A parser that places year-less stamps relative to `reference`.
    pub fn with_reference(reference: DateTime<Utc>) -> Self {
        Self { reference }
    }
}

impl Default for SyslogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser for SyslogParser {
    fn source_type(&self) -> SourceType {
        SourceType::Syslog
    }

    fn parse(&mut self, line: &str) -> ParsedLine {
        let line = line.trim_end();
        let mut fields = Fields::new();
        let (timestamp, message) = match SyslogHeader::parse(line, self.reference) {
            Some(header) => {
                put_text(&mut fields, "host", header.host);
                if let Some(program) = header.program {
                    put_text(&mut fields, "program", program);
                }
                if let Some(pid) = header.pid {
                    put_int(&mut fields, "pid", pid);
                }
                (header.timestamp, header.message)
            }
            None => (find_iso(line), line),
        };

        if let Some((category, found)) = classify(message) {
            fields.insert("category".to_string(), Value::from(category));
            fields.extend(found);
        }
        ParsedLine { timestamp, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn parse(line: &str) -> ParsedLine {
        SyslogParser::with_reference(reference()).parse(line)
    }

    #[test]
    fn bsd_header() {
        let h = SyslogHeader::parse("Jan  5 03:04:05 web-01 sshd[4242]: Connection closed", reference()).unwrap();
        assert_eq!(h.host, "web-01");
        assert_eq!(h.program, Some("sshd"));
        assert_eq!(h.pid, Some("4242"));
        assert_eq!(h.message, "Connection closed");
        assert_eq!(h.timestamp.unwrap().to_rfc3339(), "2024-01-05T03:04:05+00:00");
    }

    #[test]
    fn iso_header_without_pid() {
        let h = SyslogHeader::parse(
            "2024-02-03T04:05:06.789+01:00 gw kernel: [UFW BLOCK] IN=eth0",
            reference(),
        )
        .unwrap();
        assert_eq!(h.host, "gw");
        assert_eq!(h.program, Some("kernel"));
        assert_eq!(h.pid, None);
        assert_eq!(h.timestamp.unwrap().to_rfc3339(), "2024-02-03T03:05:06.789+00:00");
    }

    #[test]
    fn not_a_header() {
        assert!(SyslogHeader::parse("plain text line", reference()).is_none());
        assert!(SyslogHeader::parse("2024-99-99T00:00:00 host x: y", reference()).is_none());
    }

    #[test]
    fn kernel_firewall_line_is_a_flow() {
        let p = parse("Mar  1 12:00:00 gw kernel: [UFW BLOCK] IN=eth0 SRC=203.0.113.9 DST=10.0.0.2 PROTO=TCP SPT=51515 DPT=22 action=block");
        assert_eq!(p.fields["category"], json!("network_flow"));
        assert_eq!(p.fields["src"], json!("203.0.113.9"));
        assert_eq!(p.fields["dst"], json!("10.0.0.2"));
        assert_eq!(p.fields["dpt"], json!(22));
        assert_eq!(p.fields["action"], json!("deny"));
        assert_eq!(p.fields["host"], json!("gw"));
        assert_eq!(p.timestamp.unwrap().to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn source_without_destination_is_not_a_flow() {
        let p = parse("Mar  1 12:00:00 gw app: src=10.0.0.1 started");
        assert!(!p.fields.contains_key("category"));
        assert_eq!(p.fields["program"], json!("app"));
    }

    #[test]
    fn resolver_line_in_syslog() {
        let p = parse("Jan 15 10:00:01 pihole dnsmasq[812]: query[A] ads.example.com from 192.168.1.20");
        assert_eq!(p.fields["category"], json!("dns"));
        assert_eq!(p.fields["query"], json!("ads.example.com"));
        assert_eq!(p.fields["qtype"], json!("A"));
        assert_eq!(p.fields["src"], json!("192.168.1.20"));
    }

    #[test]
    fn loose_query_mention() {
        let p = parse("Jan 15 10:00:01 fw resolverd: question for 10.1.1.1 localhost then api.internal.example");
        assert_eq!(p.fields["category"], json!("dns"));
        assert_eq!(p.fields["query"], json!("api.internal.example"));
        assert_eq!(p.fields["src"], json!("10.1.1.1"));
    }

    #[rstest]
    #[case("Failed password for invalid user admin from 198.51.100.7 port 50222 ssh2", "fail", Some("admin"))]
    #[case("Failed password for root from 198.51.100.7 port 50222 ssh2", "fail", Some("root"))]
    #[case("Accepted publickey for deploy from 198.51.100.7 port 50222 ssh2: ED25519", "success", Some("deploy"))]
    #[case("pam_unix(sudo:auth): authentication failure; logname=ops rhost=198.51.100.7", "fail", None)]
    fn auth_messages(#[case] message: &str, #[case] result: &str, #[case] user: Option<&str>) {
        let p = parse(&format!("Jan 15 10:00:01 bastion sshd[77]: {message}"));
        assert_eq!(p.fields["category"], json!("auth"));
        assert_eq!(p.fields["result"], json!(result));
        assert_eq!(p.fields["src"], json!("198.51.100.7"));
        assert_eq!(p.fields.get("user").and_then(Value::as_str), user);
    }

    #[test]
    fn unclassified_keeps_header_fields() {
        let p = parse("Jan 15 10:00:01 web-01 CRON[991]: (root) CMD (run-parts /etc/cron.hourly)");
        assert_eq!(p.fields.len(), 3);
        assert_eq!(p.fields["pid"], json!(991));
    }

    #[test]
    fn headerless_line_uses_an_inline_iso_time() {
        let p = parse("login failed at 2024-05-05T05:05:05Z from 192.0.2.44");
        assert_eq!(p.fields["category"], json!("auth"));
        assert_eq!(p.timestamp.unwrap().to_rfc3339(), "2024-05-05T05:05:05+00:00");
        assert!(!p.fields.contains_key("host"));
    }

    #[test]
    fn noise_is_raw_only() {
        assert!(parse("").is_empty());
        assert!(parse("just some words").is_empty());
    }
}
