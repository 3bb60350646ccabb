//! Application logs (web apps, CMS plugins, API gateways).
//!
//! There is no common format, so lines are classified by phrase:
//!
//! * `auth` with `result` `fail` or `success` (failures are checked first so
//!   "failed login" is not read as a login)
//! * `config_change` for create/update/delete style wording
//!
//! JSON lines are read through their message, address, user and time keys.
//! Lines that match neither category stay raw-only.

use super::syslog::first_ipv4;
use super::time::{find_iso, parse_any};
use super::{json_first, put_text, LineParser, ParsedLine};
use crate::types::{Fields, SourceType};
use regex::Regex;
use serde_json::{Map, Value};
use std::net::IpAddr;
use std::sync::LazyLock;

static AUTH_FAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:failed login|login failed|authentication failed|invalid password|unauthorized|forbidden)\b")
        .expect("valid regex")
});

static AUTH_OK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:login|logged in|authentication succeeded|auth succeeded|successfully authenticated)\b")
        .expect("valid regex")
});

static CONFIG_CHANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:created|deleted|updated|changed|configured|set|added|removed|plugin|extension|token|api key)\b")
        .expect("valid regex")
});

static USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\buser(?:name)?[=:]\s*"?(?P<user>[A-Za-z0-9._@-]+)"#).expect("valid regex")
});

const MESSAGE_KEYS: &[&str] = &["msg", "message", "event", "action"];
const ADDR_KEYS: &[&str] = &["ip", "src_ip", "client_ip", "remote_addr", "remote_ip"];
const USER_KEYS: &[&str] = &["user", "username", "user_name", "login"];
const TIME_KEYS: &[&str] = &["time", "timestamp", "@timestamp", "ts"];

/// What kind of application event a message describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCategory {
    AuthFail,
    AuthSuccess,
    ConfigChange,
}

impl AppCategory {
    pub fn classify(message: &str) -> Option<Self> {
        if AUTH_FAIL_RE.is_match(message) {
            Some(AppCategory::AuthFail)
        } else if AUTH_OK_RE.is_match(message) {
            Some(AppCategory::AuthSuccess)
        } else if CONFIG_CHANGE_RE.is_match(message) {
            Some(AppCategory::ConfigChange)
        } else {
            None
        }
    }

    fn write_fields(&self, fields: &mut Fields) {
        let (category, result) = match self {
            AppCategory::AuthFail => ("auth", Some("fail")),
            AppCategory::AuthSuccess => ("auth", Some("success")),
            AppCategory::ConfigChange => ("config_change", None),
        };
        fields.insert("category".to_string(), Value::from(category));
        if let Some(result) = result {
            fields.insert("result".to_string(), Value::from(result));
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppLogParser;

impl LineParser for AppLogParser {
    fn source_type(&self) -> SourceType {
        SourceType::App
    }

    fn parse(&mut self, line: &str) -> ParsedLine {
        let trimmed = line.trim();
        if trimmed.starts_with('{') {
            if let Ok(obj) = serde_json::from_str::<Map<String, Value>>(trimmed) {
                return parse_json(&obj);
            }
        }
        parse_text(trimmed)
    }
}

fn parse_text(line: &str) -> ParsedLine {
    let Some(category) = AppCategory::classify(line) else {
        return ParsedLine::default();
    };
    let mut fields = Fields::new();
    category.write_fields(&mut fields);
    if let Some(ip) = first_ipv4(line) {
        fields.insert("src".to_string(), Value::String(ip.to_string()));
    }
    if let Some(user) = USER_RE.captures(line) {
        put_text(&mut fields, "user", &user["user"]);
    }
    ParsedLine {
        timestamp: find_iso(line),
        fields,
    }
}

fn parse_json(obj: &Map<String, Value>) -> ParsedLine {
    let message = json_first(obj, MESSAGE_KEYS).unwrap_or_default();
    let Some(category) = AppCategory::classify(&message) else {
        return ParsedLine::default();
    };
    let mut fields = Fields::new();
    category.write_fields(&mut fields);
    if let Some(ip) = json_first(obj, ADDR_KEYS).filter(|a| a.parse::<IpAddr>().is_ok()) {
        fields.insert("src".to_string(), Value::String(ip));
    } else if let Some(ip) = first_ipv4(&message) {
        fields.insert("src".to_string(), Value::String(ip.to_string()));
    }
    if let Some(user) = json_first(obj, USER_KEYS) {
        put_text(&mut fields, "user", &user);
    }
    ParsedLine {
        timestamp: json_first(obj, TIME_KEYS).and_then(|t| parse_any(&t)),
        fields,
    }
}
