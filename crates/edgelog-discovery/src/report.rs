//! Discovery report: the audit trail of one discovery run.
//!
//! Every tier that was considered appears in [`DiscoveryReport::attempts`],
//! in order, whether it found something, found nothing, failed, or was
//! skipped because an earlier tier already resolved inputs.

use chrono::{DateTime, Utc};
use edgelog_core::SourceType;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierStatus {
    /// Produced at least one candidate.
    Resolved,
    /// Ran, found nothing.
    Empty,
    /// Every attempt in the tier failed (command missing, timeout, ...).
    Failed,
    /// Not attempted; an earlier tier resolved inputs.
    Skipped,
}

/// A path the tier matched but did not select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPath {
    pub path: String,
    pub reason: String,
}

/// One strategy's attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAttempt {
    pub strategy: String,
    pub status: TierStatus,
    /// Resolved inputs: file paths, or `journal:<unit>`.
    pub candidates: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedPath>,
    pub note: String,
}

impl TierAttempt {
    pub fn produced_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub(crate) fn skipped_after(strategy: &str, resolved_by: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            status: TierStatus::Skipped,
            candidates: Vec::new(),
            skipped: Vec::new(),
            note: format!("not attempted: {resolved_by} tier already resolved inputs"),
        }
    }
}

/// An input discovery resolved but the run could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadableInput {
    pub input: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub source_type: SourceType,
    pub generated_at: DateTime<Utc>,
    pub attempts: Vec<TierAttempt>,
    /// Final resolved input set. May be empty.
    pub resolved: Vec<String>,
    #[serde(default)]
    pub unreadable: Vec<UnreadableInput>,
}

impl DiscoveryReport {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            generated_at: Utc::now(),
            attempts: Vec::new(),
            resolved: Vec::new(),
            unreadable: Vec::new(),
        }
    }

    pub fn attempt(&self, strategy: &str) -> Option<&TierAttempt> {
        self.attempts.iter().find(|a| a.strategy == strategy)
    }

    pub fn record_unreadable(&mut self, input: impl Into<String>, error: impl std::fmt::Display) {
        self.unreadable.push(UnreadableInput {
            input: input.into(),
            error: error.to_string(),
        });
    }

    /// Write the report as pretty JSON. Consumes the report: a written
    /// report is final.
    pub fn write(self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_vec_pretty(&self)?;
        json.push(b'\n');
        std::fs::write(path, json)
    }
}

/// Where the report for `output` goes: `events.jsonl` → `events.discovery.json`.
pub fn report_path_for(output: &Path) -> PathBuf {
    output.with_extension("discovery.json")
}
