//! Candidate file selection: glob expansion plus the per-run bounds.
//!
//! A pattern is split into the literal directory it starts from and the
//! glob matched below it. Only that directory is walked, symlinked
//! directories are not descended into, and `**` stops at `max_depth`.
//! Matches are deduplicated on their canonical path, so one file reached
//! through several aliases is a single candidate.

use crate::report::SkippedPath;
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// Per-run limits on what discovery hands to the parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max_files: usize,
    pub max_total_bytes: u64,
    /// How many directories deep a `**` pattern may reach.
    pub max_depth: usize,
}

impl Bounds {
    pub fn from_config(cfg: &edgelog_core::config::DiscoveryConfig) -> Self {
        Self {
            max_files: cfg.max_files,
            max_total_bytes: cfg.max_total_bytes,
            max_depth: cfg.max_depth,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Newest first.
    pub selected: Vec<PathBuf>,
    pub skipped: Vec<SkippedPath>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

const MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn has_glob_chars(s: &str) -> bool {
    s.contains(&['*', '?', '['][..])
}

/// One walk: a directory and the globs matched against paths below it.
#[derive(Debug)]
struct WalkPlan {
    base: PathBuf,
    globs: Vec<(Pattern, usize)>,
}

impl WalkPlan {
    fn depth(&self) -> usize {
        self.globs.iter().map(|(_, d)| *d).max().unwrap_or(0)
    }

    fn matches(&self, rel: &Path, depth: usize) -> bool {
        self.globs
            .iter()
            .any(|(g, max)| depth <= *max && g.matches_path_with(rel, MATCH))
    }
}

/// Split `pattern` into its literal leading directory and the rest, compiled.
/// Relative patterns start from `root`.
fn split_pattern(root: &Path, pattern: &str, max_depth: usize) -> Option<(PathBuf, Pattern, usize)> {
    let parts: Vec<&str> = pattern.split('/').collect();
    let first_glob = parts
        .iter()
        .position(|p| has_glob_chars(p))
        .unwrap_or(parts.len() - 1);
    let literal = parts[..first_glob].join("/");
    let rest = parts[first_glob..].join("/");

    let base = match literal.as_str() {
        "" if pattern.starts_with('/') => PathBuf::from("/"),
        "" => root.to_path_buf(),
        lit => root.join(lit),
    };
    let depth = if rest.split('/').any(|p| p == "**") {
        max_depth
    } else {
        rest.split('/').count()
    };
    match Pattern::new(&rest) {
        Ok(glob) => Some((base, glob, depth)),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid discovery glob");
            None
        }
    }
}

fn plan<S: AsRef<str>>(root: &Path, patterns: &[S], max_depth: usize) -> Vec<WalkPlan> {
    let mut plans: Vec<WalkPlan> = Vec::new();
    for pattern in patterns {
        let Some((base, glob, depth)) = split_pattern(root, pattern.as_ref(), max_depth) else {
            continue;
        };
        match plans.iter_mut().find(|p| p.base == base) {
            Some(plan) => plan.globs.push((glob, depth)),
            None => plans.push(WalkPlan {
                base,
                globs: vec![(glob, depth)],
            }),
        }
    }
    plans
}

/// A regular file, or a symlink to one.
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() {
        std::fs::metadata(entry.path()).is_ok_and(|m| m.is_file())
    } else {
        entry.file_type().is_file()
    }
}

/// Walk every plan, collecting distinct matching files until `limit`.
fn collect(plans: &[WalkPlan], limit: usize) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for plan in plans {
        let walker = WalkDir::new(&plan.base)
            .follow_links(false)
            .max_depth(plan.depth())
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!(error = %e, "discovery walk entry unreadable");
                    continue;
                }
            };
            if entry.depth() == 0 || !is_regular_file(&entry) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&plan.base) else {
                continue;
            };
            if !plan.matches(rel, entry.depth()) {
                continue;
            }
            let key = std::fs::canonicalize(entry.path()).unwrap_or_else(|_| entry.path().to_path_buf());
            if seen.insert(key) {
                paths.push(entry.into_path());
                if paths.len() >= limit {
                    return paths;
                }
            }
        }
    }
    paths
}

/// Expand absolute `patterns` (relative ones start at the working
/// directory), keeping regular files only, first occurrence wins. Invalid
/// patterns and unreadable directory entries are logged and ignored.
pub fn glob_many<S: AsRef<str>>(patterns: &[S], max_depth: usize) -> Vec<PathBuf> {
    collect(&plan(Path::new("."), patterns, max_depth), usize::MAX)
}

/// Expand `patterns` relative to `root`, stopping after `limit` distinct
/// files.
pub fn glob_under<S: AsRef<str>>(root: &Path, patterns: &[S], max_depth: usize, limit: usize) -> Vec<PathBuf> {
    collect(&plan(root, patterns, max_depth), limit)
}

/// Order `paths` newest first and keep as many as the bounds allow.
pub fn select(paths: Vec<PathBuf>, bounds: Bounds) -> Selection {
    let mut selection = Selection::default();
    let mut sized = Vec::with_capacity(paths.len());

    for path in paths {
        match std::fs::metadata(&path) {
            Ok(meta) => {
                let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                sized.push((path, meta.len(), mtime));
            }
            Err(e) => selection.skipped.push(SkippedPath {
                path: path.display().to_string(),
                reason: format!("stat failed: {e}"),
            }),
        }
    }

    sized.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

    let mut total = 0u64;
    for (path, len, _) in sized {
        let reason = if selection.selected.len() >= bounds.max_files {
            Some(format!("over max_files ({})", bounds.max_files))
        } else if total.saturating_add(len) > bounds.max_total_bytes {
            Some(format!("over max_total_bytes ({})", bounds.max_total_bytes))
        } else {
            None
        };
        match reason {
            Some(reason) => selection.skipped.push(SkippedPath {
                path: path.display().to_string(),
                reason,
            }),
            None => {
                total += len;
                selection.selected.push(path);
            }
        }
    }
    selection
}
