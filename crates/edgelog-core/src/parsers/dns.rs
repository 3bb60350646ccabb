//! DNS resolver query logs.
//!
//! Three dialects are recognised, anywhere in the line so syslog and journal
//! prefixes do not matter:
//!
//! ```text
//! bind     client @0x7f.. 192.0.2.10#53211 (example.com): query: example.com IN A +E(0)K (10.0.0.53)
//! dnsmasq  query[AAAA] example.com from 192.0.2.10
//! unbound  info: 192.0.2.10 example.com. A IN
//! ```
//!
//! A query whose name does not look like a DNS name is not reported.

use super::syslog::SyslogHeader;
use super::time::{find_iso, parse_bind_time, parse_epoch};
use super::{put_port, LineParser, ParsedLine};
use crate::types::{Fields, SourceType};
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde_json::Value;
use std::net::IpAddr;
use std::sync::LazyLock;

static BIND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"client\s+(?:@0x[0-9A-Fa-f]+\s+)?(?P<ip>[0-9A-Fa-f:.]+)#(?P<port>\d+)(?:\s+\([^)]*\))?:\s+(?:view\s+\S+:\s+)?query:\s+(?P<qname>\S+)\s+IN\s+(?P<qtype>[A-Za-z0-9]+)",
    )
    .expect("valid regex")
});

static DNSMASQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"query\[(?P<qtype>[A-Za-z0-9]+)\]\s+(?P<qname>\S+)\s+from\s+(?P<ip>[0-9A-Fa-f:.]+)")
        .expect("valid regex")
});

static UNBOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"info:\s+(?P<ip>[0-9A-Fa-f:.]+)\s+(?P<qname>\S+)\s+(?P<qtype>[A-Za-z0-9]+)\s+IN\b")
        .expect("valid regex")
});

static BIND_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{2}-[A-Z][a-z]{2}-\d{4} \d{2}:\d{2}:\d{2}(?:\.\d+)?").expect("valid regex")
});

static UNBOUND_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d{9,13})\]").expect("valid regex"));

static QNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid regex"));

/// Which resolver wrote the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolver {
    Bind,
    Dnsmasq,
    Unbound,
}

impl Resolver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolver::Bind => "bind",
            Resolver::Dnsmasq => "dnsmasq",
            Resolver::Unbound => "unbound",
        }
    }
}

/// One client query pulled out of a resolver log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    pub resolver: Resolver,
    pub client: IpAddr,
    pub client_port: Option<String>,
    pub qname: String,
    pub qtype: String,
}

impl DnsQuery {
    pub fn write_fields(&self, fields: &mut Fields) {
        fields.insert("src".to_string(), Value::String(self.client.to_string()));
        if let Some(port) = &self.client_port {
            put_port(fields, "spt", port);
        }
        fields.insert("query".to_string(), Value::String(self.qname.clone()));
        fields.insert("qtype".to_string(), Value::String(self.qtype.clone()));
        fields.insert("resolver".to_string(), Value::from(self.resolver.as_str()));
    }
}

/// Normalise a query name: strip wrapping punctuation, a trailing `:` and the
/// root dot. Names that are too long, contain other characters, or have no
/// dot at all are rejected.
pub fn clean_qname(raw: &str) -> Option<String> {
    let q = raw
        .trim()
        .trim_end_matches(':')
        .trim_matches(|c| matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '"' | '\''))
        .trim_end_matches(':');
    if q.is_empty() || q.len() > 255 {
        return None;
    }
    let q = q.strip_suffix('.').unwrap_or(q);
    if !QNAME_RE.is_match(q) || !q.contains('.') {
        return None;
    }
    Some(q.to_string())
}

fn query_from(caps: Captures<'_>, resolver: Resolver) -> Option<DnsQuery> {
    Some(DnsQuery {
        resolver,
        client: caps["ip"].parse().ok()?,
        client_port: caps.name("port").map(|m| m.as_str().to_string()),
        qname: clean_qname(&caps["qname"])?,
        qtype: caps["qtype"].to_ascii_uppercase(),
    })
}

/// The query carried by `line`, trying each dialect in turn.
pub fn find_query(line: &str) -> Option<DnsQuery> {
    [
        (&*BIND_RE, Resolver::Bind),
        (&*DNSMASQ_RE, Resolver::Dnsmasq),
        (&*UNBOUND_RE, Resolver::Unbound),
    ]
    .into_iter()
    .find_map(|(re, resolver)| re.captures(line).and_then(|c| query_from(c, resolver)))
}

#[derive(Debug, Clone, Copy)]
pub struct DnsQueryParser {
    /// Anchors the year of RFC 3164 stamps (dnsmasq and Pi-hole via syslog).
    reference: DateTime<Utc>,
}

impl DnsQueryParser {
    pub fn new() -> Self {
        Self::with_reference(Utc::now())
    }

    pub fn with_reference(reference: DateTime<Utc>) -> Self {
        Self { reference }
    }

    fn timestamp(&self, line: &str) -> Option<DateTime<Utc>> {
        find_iso(line)
            .or_else(|| BIND_TIME_RE.find(line).and_then(|m| parse_bind_time(m.as_str())))
            .or_else(|| {
                UNBOUND_TIME_RE
                    .captures(line)
                    .and_then(|c| parse_epoch(&c[1]))
            })
            .or_else(|| SyslogHeader::parse(line, self.reference).and_then(|h| h.timestamp))
    }
}

impl Default for DnsQueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser for DnsQueryParser {
    fn source_type(&self) -> SourceType {
        SourceType::Dns
    }

    fn parse(&mut self, line: &str) -> ParsedLine {
        let Some(query) = find_query(line) else {
            return ParsedLine::default();
        };
        let mut fields = Fields::new();
        query.write_fields(&mut fields);
        ParsedLine {
            timestamp: self.timestamp(line),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn parser() -> DnsQueryParser {
        DnsQueryParser::with_reference(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    #[rstest]
    #[case("example.com", Some("example.com"))]
    #[case("Example.COM.", Some("Example.COM"))]
    #[case("(www.example.org):", Some("www.example.org"))]
    #[case("_dmarc.example.net", Some("_dmarc.example.net"))]
    #[case("localhost", None)]
    #[case("bad name.com", None)]
    #[case("evil;rm.com", None)]
    #[case("", None)]
    fn qname_cleaning(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(clean_qname(raw).as_deref(), expected);
    }

    #[test]
    fn overlong_qname_is_rejected() {
        let long = format!("{}.com", "a".repeat(260));
        assert_eq!(clean_qname(&long), None);
    }

    #[test]
    fn bind_query_log() {
        let line = "15-Jan-2024 10:00:00.123 queries: info: client @0x7f3a2c0a1b20 192.0.2.10#53211 (example.com): query: example.com IN A +E(0)K (10.0.0.53)";
        let p = parser().parse(line);
        assert_eq!(p.fields["src"], json!("192.0.2.10"));
        assert_eq!(p.fields["spt"], json!(53211));
        assert_eq!(p.fields["query"], json!("example.com"));
        assert_eq!(p.fields["qtype"], json!("A"));
        assert_eq!(p.fields["resolver"], json!("bind"));
        assert_eq!(p.timestamp.unwrap().to_rfc3339(), "2024-01-15T10:00:00.123+00:00");
    }

    #[test]
    fn bind_with_view_and_ipv6_client() {
        let line = "client 2001:db8::7#5353 (mail.example.org): view internal: query: mail.example.org IN MX + (::1)";
        let p = parser().parse(line);
        assert_eq!(p.fields["src"], json!("2001:db8::7"));
        assert_eq!(p.fields["qtype"], json!("MX"));
        assert!(p.timestamp.is_none());
    }

    #[test]
    fn dnsmasq_through_syslog() {
        let line = "Jan 15 10:00:01 pihole dnsmasq[812]: query[AAAA] cdn.example.net from 192.168.1.20";
        let p = parser().parse(line);
        assert_eq!(p.fields["src"], json!("192.168.1.20"));
        assert_eq!(p.fields["query"], json!("cdn.example.net"));
        assert_eq!(p.fields["qtype"], json!("AAAA"));
        assert_eq!(p.fields["resolver"], json!("dnsmasq"));
        assert!(!p.fields.contains_key("spt"));
        assert_eq!(p.timestamp.unwrap().to_rfc3339(), "2024-01-15T10:00:01+00:00");
    }

    #[test]
    fn unbound_with_epoch_prefix() {
        let line = "[1700000000] unbound[1234:0] info: 10.0.0.5 tracker.example.io. TXT IN";
        let p = parser().parse(line);
        assert_eq!(p.fields["query"], json!("tracker.example.io"));
        assert_eq!(p.fields["qtype"], json!("TXT"));
        assert_eq!(p.fields["resolver"], json!("unbound"));
        assert_eq!(p.timestamp.unwrap().timestamp(), 1_700_000_000);
    }

    #[rstest]
    #[case("query[A] localhost from 127.0.0.1")]
    #[case("query[A] example.com from not-an-ip")]
    #[case("dnsmasq[812]: reply example.com is 93.184.216.34")]
    #[case("")]
    fn non_queries_are_raw_only(#[case] line: &str) {
        assert!(parser().parse(line).is_empty());
    }
}
