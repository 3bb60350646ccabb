//! Static log corpora used across harnesses.
//!
//! Each corpus is a `&'static [&'static str]` of representative lines for one
//! source family. [`corpus_high_volume`] builds a larger mixed web corpus for
//! throughput paths.

use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};

/// nginx/Apache access lines: common, combined, combined + XFF, JSON, and
/// one malformed line.
pub const CORPUS_WEB: &[&str] = &[
    r#"127.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET /x HTTP/1.1" 200 1234"#,
    r#"203.0.113.7 - alice [10/Oct/2023:13:56:01 -0700] "POST /login HTTP/2.0" 302 - "https://example.com/" "curl/8.4.0""#,
    r#"10.0.0.5 - - [10/Oct/2023:13:57:12 -0700] "GET /api HTTP/1.1" 200 512 "-" "Mozilla/5.0" "198.51.100.23, 10.0.0.1""#,
    r#"{"remote_addr":"192.0.2.10","request":"GET /health HTTP/1.1","status":200,"body_bytes_sent":17,"time_iso8601":"2023-10-10T21:00:00+00:00"}"#,
    r#"10.0.0.9 - - [10/Oct/2023:13:58:00 -0700] "GET /broken HTTP/1.1 200 10"#,
];

/// Load-balancer access entries (AWS documented sample, IPv6 client with an
/// unreached target).
pub const CORPUS_ALB: &[&str] = &[
    r#"http 2015-05-13T23:39:43.945958Z app/my-lb/50dc6c495c0c9188 192.0.2.10:2817 10.0.0.1:80 0.000 0.026 0.000 200 200 0 57 "GET http://www.example.com:80/ HTTP/1.1" "curl/7.38.0" - - arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067 "Root=1-58337262-36d228ad5d99923122bbe354" "-" "-" 0 2015-05-13T23:39:43.923000Z "forward" "-" "-" "10.0.0.1:80" "200" "-" "-""#,
    r#"h2 2024-03-01T00:00:00.000000Z app/lb/1 [::1]:443 - -1 -1 -1 503 - 120 0 "GET https://api.example.com/v1 HTTP/2.0" "-""#,
];

/// One line per firewall encoding, plus JSON carrying `key=value` text.
pub const CORPUS_FIREWALL: &[&str] = &[
    "src=10.0.0.1 dst=10.0.0.2 dpt=443 action=deny",
    r#"{"src_ip":"192.0.2.1","dst_ip":"192.0.2.2","dst_port":22,"action":"allow","msg":"src=6.6.6.6 dpt=9999 action=deny"}"#,
    "CEF:0|Fortinet|FortiGate|7.0|13|traffic|3|src=1.1.1.1 dst=2.2.2.2 dpt=80 act=block",
    "2024-01-15T10:00:00Z,10.0.0.1,10.0.0.2,51000,443,tcp,deny,0",
];

/// Resolver query lines: BIND, dnsmasq via syslog, unbound, and a reply
/// line that is not a query.
pub const CORPUS_DNS: &[&str] = &[
    "15-Jan-2024 10:00:00.123 queries: info: client @0x7f3a2c0a1b20 192.0.2.10#53211 (example.com): query: example.com IN A +E(0)K (10.0.0.53)",
    "Jan 15 10:00:01 pihole dnsmasq[812]: query[AAAA] cdn.example.net from 192.168.1.20",
    "[1700000000] unbound[1234:0] info: 10.0.0.5 tracker.example.io. TXT IN",
    "Jan 15 10:00:01 pihole dnsmasq[812]: reply cdn.example.net is 2001:db8::10",
];

/// Syslog lines, one per category plus an unclassified cron line.
pub const CORPUS_SYSLOG: &[&str] = &[
    "Mar  1 12:00:00 gw kernel: [UFW BLOCK] IN=eth0 SRC=203.0.113.9 DST=10.0.0.2 PROTO=TCP SPT=51515 DPT=22 action=block",
    "Jan 15 10:00:01 pihole dnsmasq[812]: query[A] ads.example.com from 192.168.1.20",
    "Jan 15 10:00:02 bastion sshd[77]: Failed password for invalid user admin from 198.51.100.7 port 50222 ssh2",
    "Jan 15 10:00:03 bastion sshd[78]: Accepted publickey for deploy from 198.51.100.8 port 50223 ssh2",
    "Jan 15 10:00:04 web-01 CRON[991]: (root) CMD (run-parts /etc/cron.hourly)",
];

/// Application lines: failed and successful logins, a config change, a JSON
/// line, and an unclassified request line.
pub const CORPUS_APP: &[&str] = &[
    "2024-04-02T09:30:00Z WARN auth: failed login for user=alice from 203.0.113.5",
    "2024-04-02T09:30:05Z INFO auth: user=alice logged in from 203.0.113.5",
    "2024-04-02T09:31:00Z INFO admin: plugin webhooks updated to 2.1",
    r#"{"ts":"2024-04-02T10:00:00Z","level":"warn","msg":"unauthorized","remote_addr":"198.51.100.23"}"#,
    "2024-04-02T10:01:00Z INFO GET /healthz 200",
];

/// Lines no parser should structure. Every family must keep them raw-only.
pub const CORPUS_MALFORMED: &[&str] = &[
    r#"127.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET /x HTTP/1.1 200 1234"#,
    "kernel: eth0 link up, 1000Mbps",
    "\u{fffd}\u{fffd} binary noise \u{fffd}",
    "[unterminated bracket",
];

/// Fixed fallback time so outputs are comparable across runs.
pub fn fixed_fallback() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// 1 000 synthetic combined-format lines for throughput testing.
pub fn corpus_high_volume() -> Vec<String> {
    (0..1_000usize)
        .map(|i| {
            let status = match i % 10 {
                0 => 500,
                1 | 2 => 404,
                _ => 200,
            };
            format!(
                r#"10.0.{}.{} - - [15/Jan/2024:{:02}:{:02}:{:02} +0000] "GET /item/{} HTTP/1.1" {} {} "-" "bench/1.0""#,
                i / 256 % 256,
                i % 256,
                i / 3600 % 24,
                i / 60 % 60,
                i % 60,
                i,
                status,
                i * 7,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fixture file generation helpers
// ---------------------------------------------------------------------------

/// Write `lines` to `dir/name`, newline-terminated.
pub fn write_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(&path, body).unwrap();
    path
}

/// Write `lines` gzip-compressed, as logrotate leaves older generations.
pub fn write_gz_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let path = dir.join(name);
    let mut enc = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
    for line in lines {
        enc.write_all(line.as_bytes()).unwrap();
        enc.write_all(b"\n").unwrap();
    }
    enc.finish().unwrap();
    path
}

/// Read a JSONL output back as JSON values.
pub fn read_jsonl(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}
