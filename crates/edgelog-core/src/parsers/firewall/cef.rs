//! ArcSight Common Event Format.
//!
//! ```text
//! [syslog prefix] CEF:Version|Device Vendor|Device Product|Device Version|Signature ID|Name|Severity|Extension
//! ```
//!
//! Header fields are separated by unescaped pipes. The extension is a
//! space-separated `key=value` list where values may themselves contain
//! spaces, so a value runs until the next ` key=`.

use super::{flow_fields, has_verdict, Detection, EncodingDetector, FlowEncoding};
use crate::parsers::put_text;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CEF:\d+\|").expect("CEF header pattern is valid"));

static EXT_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(?P<k>[A-Za-z0-9_.]+)=").expect("CEF extension key pattern is valid")
});

/// Header field names after the version, in order.
pub const HEADER_FIELDS: &[&str] = &["vendor", "product", "device_version", "signature", "name", "severity"];

/// Byte offset of `CEF:` when the line carries a CEF header.
pub fn header_start(line: &str) -> Option<usize> {
    HEADER_RE.find(line).map(|m| m.start())
}

/// Split the header on unescaped pipes. Returns the header fields (version
/// first, at most seven) and the extension, if the header was complete.
pub fn split_header(cef: &str) -> (Vec<String>, Option<&str>) {
    let mut fields = Vec::with_capacity(7);
    let mut current = String::new();
    let mut chars = cef.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, n @ ('|' | '\\'))) => current.push(n),
                Some((_, n)) => {
                    current.push('\\');
                    current.push(n);
                }
                None => current.push('\\'),
            },
            '|' => {
                fields.push(std::mem::take(&mut current));
                if fields.len() == 7 {
                    return (fields, Some(&cef[i + 1..]));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    (fields, None)
}

/// Extension `key=value` pairs, keys lowercased, `\=` and `\\` resolved.
pub fn parse_extension(ext: &str) -> Vec<(String, String)> {
    let keys: Vec<_> = EXT_KEY_RE.captures_iter(ext).collect();
    let mut pairs = Vec::with_capacity(keys.len());

    for (idx, caps) in keys.iter().enumerate() {
        let (Some(whole), Some(key)) = (caps.get(0), caps.name("k")) else {
            continue;
        };
        let value_end = keys
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(ext.len(), |m| m.start());
        let value = ext[whole.end()..value_end]
            .trim()
            .replace("\\=", "=")
            .replace("\\\\", "\\");
        pairs.push((key.as_str().to_ascii_lowercase(), value));
    }
    pairs
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CefDetector;

impl EncodingDetector for CefDetector {
    fn encoding(&self) -> FlowEncoding {
        FlowEncoding::Cef
    }

    fn detect(&mut self, line: &str) -> Detection {
        let Some(start) = header_start(line) else {
            return Detection::Miss;
        };
        let (header, ext) = split_header(&line[start + "CEF:".len()..]);

        let mut ext_pairs: HashMap<String, String> = HashMap::new();
        for (k, v) in ext.map(parse_extension).unwrap_or_default() {
            ext_pairs.entry(k).or_insert(v);
        }

        let mut parsed = flow_fields(|k| ext_pairs.get(k).cloned());
        // header[0] is the CEF version.
        for (name, value) in HEADER_FIELDS.iter().zip(header.iter().skip(1)) {
            put_text(&mut parsed.fields, name, value);
        }

        if has_verdict(&parsed) {
            Detection::Match(parsed)
        } else {
            Detection::Claimed(parsed)
        }
    }
}
