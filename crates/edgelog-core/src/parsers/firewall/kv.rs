//! `key=value` flow lines (iptables/ufw kernel logs, FortiGate, pfSense
//! filterlog rewrites, generic syslog exporters).

use super::{cef, flow_fields, has_verdict, is_flow_alias, Detection, EncodingDetector, FlowEncoding};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static KV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[\s,;|])(?P<k>[A-Za-z_@][A-Za-z0-9_.@-]*)=(?:"(?P<dq>(?:[^"\\]|\\.)*)"|'(?P<sq>[^']*)'|(?P<v>[^\s,;"']*))"#,
    )
    .expect("key=value pattern is valid")
});

/// Every `key=value` pair in `line`, keys lowercased, in order of appearance.
/// Quoted values are unquoted; text inside quotes never yields pairs.
pub fn scan_pairs(line: &str) -> Vec<(String, String)> {
    KV_RE
        .captures_iter(line)
        .filter_map(|c| {
            let key = c.name("k")?.as_str().to_ascii_lowercase();
            let value = c
                .name("dq")
                .map(|m| m.as_str().replace("\\\"", "\""))
                .or_else(|| c.name("sq").map(|m| m.as_str().to_string()))
                .or_else(|| c.name("v").map(|m| m.as_str().to_string()))?;
            Some((key, value))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueDetector;

impl EncodingDetector for KeyValueDetector {
    fn encoding(&self) -> FlowEncoding {
        FlowEncoding::KeyValue
    }

    fn detect(&mut self, line: &str) -> Detection {
        // CEF extensions are key=value too, but the header belongs to the
        // tagged detector.
        if !line.contains('=') || cef::header_start(line).is_some() {
            return Detection::Miss;
        }

        let mut known: HashMap<String, String> = HashMap::new();
        for (k, v) in scan_pairs(line) {
            if is_flow_alias(&k) {
                known.entry(k).or_insert(v);
            }
        }
        if known.is_empty() {
            return Detection::Miss;
        }

        let parsed = flow_fields(|k| known.get(k).cloned());
        if has_verdict(&parsed) {
            Detection::Match(parsed)
        } else {
            Detection::Miss
        }
    }
}
