//! Core types for edgelog-core.
//!
//! This module defines the fundamental data structures shared across the
//! parsers, the exporter and the discovery engine: the normalised
//! [`NormalizedEvent`], its [`EventTime`], and the [`SourceType`]
//! discriminant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Normalised key → value map carried by every event. Keys are sorted so
/// serialized records are stable across runs.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A normalised event (schema v0) produced by an adapter run.
///
/// Every field is mandatory except the contents of `fields`. The parsers
/// populate as many fields as they can; a line they cannot understand still
/// becomes an event with `fields` empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// When the underlying line happened, and where that value came from.
    #[serde(flatten)]
    pub timestamp: EventTime,
    /// Operator-supplied identifier of the host the logs were collected from.
    pub asset: String,
    /// Adapter that produced this event.
    pub source_type: SourceType,
    /// Structured fields extracted from the line. Only values that were
    /// successfully extracted and coerced appear here.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: Fields,
    /// The original line, minus its line terminator.
    pub raw: String,
}

impl NormalizedEvent {
    /// True when no parser could extract structure from the line.
    pub fn is_raw_only(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Event time plus its provenance.
///
/// A line that carries no parseable timestamp is stamped with the run's
/// fallback time and marked [`TimeSource::Fallback`], so consumers (and
/// tests) can tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(rename = "timestamp")]
    pub at: DateTime<Utc>,
    #[serde(rename = "timestamp_source")]
    pub source: TimeSource,
}

impl EventTime {
    pub fn from_line(at: DateTime<Utc>) -> Self {
        Self {
            at,
            source: TimeSource::Line,
        }
    }

    pub fn fallback(at: DateTime<Utc>) -> Self {
        Self {
            at,
            source: TimeSource::Fallback,
        }
    }
}

/// Where an [`EventTime`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    /// Parsed from the log line itself.
    Line,
    /// Process start time of the run; the line had no usable timestamp.
    Fallback,
}

/// Which adapter family an input belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Web,
    Alb,
    Firewall,
    Dns,
    Syslog,
    App,
}

impl SourceType {
    pub const ALL: [SourceType; 6] = [
        SourceType::Web,
        SourceType::Alb,
        SourceType::Firewall,
        SourceType::Dns,
        SourceType::Syslog,
        SourceType::App,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Web => "web",
            SourceType::Alb => "alb",
            SourceType::Firewall => "firewall",
            SourceType::Dns => "dns",
            SourceType::Syslog => "syslog",
            SourceType::App => "app",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "web" | "nginx" | "apache" => Ok(SourceType::Web),
            "alb" | "elb" => Ok(SourceType::Alb),
            "firewall" | "fw" | "flow" => Ok(SourceType::Firewall),
            "dns" | "bind" | "named" | "dnsmasq" | "unbound" | "pihole" => Ok(SourceType::Dns),
            "syslog" | "rsyslog" => Ok(SourceType::Syslog),
            "app" | "apps" | "application" => Ok(SourceType::App),
            _ => Err(UnknownSourceType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown source type {0:?} (expected web, alb, firewall, dns, syslog or app)")]
pub struct UnknownSourceType(pub String);

/// Where a candidate input's lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A file on disk (possibly a rotated `.gz`).
    Path(PathBuf),
    /// Lines captured from the service journal for `unit`. There is no file;
    /// the lines are held in memory for the duration of the run.
    Journal { unit: String, lines: Vec<String> },
}

/// A discovered or operator-supplied input, not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateInput {
    pub source: InputSource,
    pub hint: SourceType,
}

impl CandidateInput {
    pub fn path(path: impl Into<PathBuf>, hint: SourceType) -> Self {
        Self {
            source: InputSource::Path(path.into()),
            hint,
        }
    }

    pub fn journal(unit: impl Into<String>, lines: Vec<String>, hint: SourceType) -> Self {
        Self {
            source: InputSource::Journal {
                unit: unit.into(),
                lines,
            },
            hint,
        }
    }

    /// Identifier used in reports and logs: the path, or `journal:<unit>`.
    pub fn id(&self) -> String {
        match &self.source {
            InputSource::Path(p) => p.display().to_string(),
            InputSource::Journal { unit, .. } => format!("journal:{unit}"),
        }
    }
}
