//! JSON flow records (cloud firewalls, ECS-shaped exporters, jq output).

use super::{flow_fields, has_verdict, Detection, EncodingDetector, FlowEncoding};
use crate::parsers::{json_scalar, ParsedLine};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Nested objects are flattened to dotted keys this deep (`source.ip`).
const MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDetector;

impl EncodingDetector for JsonDetector {
    fn encoding(&self) -> FlowEncoding {
        FlowEncoding::Json
    }

    /// Any valid JSON document claims the line. Objects are read directly;
    /// an array contributes its first object element.
    fn detect(&mut self, line: &str) -> Detection {
        let Ok(doc) = serde_json::from_str::<Value>(line) else {
            return Detection::Miss;
        };
        let obj = match &doc {
            Value::Object(obj) => obj,
            Value::Array(items) => match items.iter().find_map(Value::as_object) {
                Some(obj) => obj,
                None => return Detection::Claimed(ParsedLine::default()),
            },
            _ => return Detection::Claimed(ParsedLine::default()),
        };

        let mut flat = HashMap::new();
        flatten("", obj, 0, &mut flat);
        let parsed = flow_fields(|k| flat.get(k).cloned());

        if has_verdict(&parsed) {
            Detection::Match(parsed)
        } else {
            Detection::Claimed(parsed)
        }
    }
}

/// Lowercased dotted key → scalar text. The first spelling of a key wins.
fn flatten(prefix: &str, obj: &Map<String, Value>, depth: usize, out: &mut HashMap<String, String>) {
    for (k, v) in obj {
        let key = if prefix.is_empty() {
            k.to_ascii_lowercase()
        } else {
            format!("{prefix}.{}", k.to_ascii_lowercase())
        };
        match v {
            Value::Object(inner) if depth + 1 < MAX_DEPTH => flatten(&key, inner, depth + 1, out),
            other => {
                if let Some(text) = json_scalar(other) {
                    out.entry(key).or_insert(text);
                }
            }
        }
    }
}
