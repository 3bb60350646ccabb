//! Web access log discovery: server config, then well-known globs, then the
//! service journal.

use crate::command::{CommandRunner, CommandSpec};
use crate::report::{TierAttempt, TierStatus};
use crate::select::{self, Bounds};
use crate::TierOutcome;
use edgelog_core::config::WebConfig;
use edgelog_core::{CandidateInput, SourceType};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// The web tiers, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebTier {
    Config,
    Glob,
    Journal,
}

impl WebTier {
    pub const ALL: [WebTier; 3] = [WebTier::Config, WebTier::Glob, WebTier::Journal];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebTier::Config => "config",
            WebTier::Glob => "glob",
            WebTier::Journal => "journal",
        }
    }
}

// ---------------------------------------------------------------------------
// Directive extraction
// ---------------------------------------------------------------------------

// Directives may follow `{` or `;` on the same line (one-line blocks).
static ACCESS_LOG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s{;])access_log[ \t]+("[^"]*"|'[^']*'|[^\s;]+)"#).expect("valid regex")
});

static CUSTOM_LOG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|[\s>])(?:CustomLog|TransferLog)[ \t]+("[^"]*"|'[^']*'|\S+)"#)
        .expect("valid regex")
});

static HTTPD_ROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"-D\s+HTTPD_ROOT="([^"]+)""#).expect("valid regex"));

/// Config lines that are not `#` comments.
fn uncommented(conf: &str) -> impl Iterator<Item = &str> {
    conf.lines().filter(|line| !line.trim_start().starts_with('#'))
}

fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}

fn resolve(path: &str, base: &Path) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// `access_log` targets in an nginx config (or `nginx -T` dump). `off`,
/// `syslog:` targets and paths built from `$variables` are skipped; relative
/// paths resolve under `log_dir`. Paths may still contain glob characters.
pub fn nginx_access_log_paths(conf: &str, log_dir: &Path) -> Vec<PathBuf> {
    uncommented(conf)
        .flat_map(|line| ACCESS_LOG_RE.captures_iter(line))
        .filter_map(|c| c.get(1).map(|m| unquote(m.as_str())))
        .filter(|p| !p.is_empty() && *p != "off" && !p.starts_with("syslog:") && !p.contains('$'))
        .map(|p| resolve(p, log_dir))
        .collect()
}

/// `HTTPD_ROOT` from `apachectl -V` output.
pub fn httpd_root(settings: &str) -> Option<PathBuf> {
    HTTPD_ROOT_RE
        .captures(settings)
        .map(|c| PathBuf::from(&c[1]))
}

/// `CustomLog` targets in an Apache config. Piped loggers and paths with
/// variables are skipped; relative paths resolve under `log_dir`.
pub fn apache_custom_log_paths(conf: &str, log_dir: &Path) -> Vec<PathBuf> {
    uncommented(conf)
        .flat_map(|line| CUSTOM_LOG_RE.captures_iter(line))
        .filter_map(|c| c.get(1).map(|m| unquote(m.as_str())))
        .filter(|p| !p.is_empty() && !p.starts_with('|') && !p.contains('$'))
        .map(|p| resolve(p, log_dir))
        .collect()
}

/// Existing regular files named by `paths`, expanding glob patterns.
fn existing_files(paths: Vec<PathBuf>, max_depth: usize) -> Vec<PathBuf> {
    let patterns: Vec<String> = paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
    select::glob_many(&patterns, max_depth)
}

fn apache_log_dir(cfg: &WebConfig) -> PathBuf {
    cfg.apache_log_dirs
        .iter()
        .find(|d| d.is_dir())
        .or(cfg.apache_log_dirs.last())
        .cloned()
        .unwrap_or_else(|| PathBuf::from("/var/log/apache2"))
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Tier 1. Ask the servers where they log.
pub(crate) async fn config_tier<R: CommandRunner>(
    runner: &R,
    cfg: &WebConfig,
    bounds: Bounds,
) -> TierOutcome {
    let mut notes = Vec::new();
    let mut sources_read = 0;
    let mut paths = Vec::new();

    // nginx: the full dump includes every `include`d file.
    let nginx_text = match runner.run(&CommandSpec::nginx_dump()).await {
        Ok(text) => {
            notes.push("read `nginx -T`".to_string());
            Some(text)
        }
        Err(e) => {
            notes.push(e.to_string());
            match std::fs::read(&cfg.nginx_conf) {
                Ok(bytes) => {
                    notes.push(format!("read {}", cfg.nginx_conf.display()));
                    Some(String::from_utf8_lossy(&bytes).into_owned())
                }
                Err(e) => {
                    notes.push(format!("{}: {e}", cfg.nginx_conf.display()));
                    None
                }
            }
        }
    };
    if let Some(text) = nginx_text {
        sources_read += 1;
        paths.extend(nginx_access_log_paths(&text, &cfg.nginx_log_dir));
    }

    // Apache: no full dump, so scan the usual config files.
    let mut confs = cfg.apache_confs.clone();
    match runner.run(&CommandSpec::apache_settings()).await {
        Ok(settings) => {
            if let Some(root) = httpd_root(&settings) {
                let conf = root.join("conf/httpd.conf");
                if !confs.contains(&conf) {
                    confs.push(conf);
                }
            }
        }
        Err(e) => notes.push(e.to_string()),
    }
    let log_dir = apache_log_dir(cfg);
    for conf in &confs {
        // Missing files are the common case; only count the ones read.
        if let Ok(bytes) = std::fs::read(conf) {
            sources_read += 1;
            notes.push(format!("read {}", conf.display()));
            paths.extend(apache_custom_log_paths(&String::from_utf8_lossy(&bytes), &log_dir));
        }
    }

    let selection = select::select(existing_files(paths, bounds.max_depth), bounds);
    let failed = sources_read == 0;
    TierOutcome::from_selection(WebTier::Config.as_str(), selection, SourceType::Web, failed, notes)
}

/// Tier 2. Well-known log locations, rotated and compressed variants included.
pub(crate) fn glob_tier(cfg: &WebConfig, bounds: Bounds) -> TierOutcome {
    let globs = cfg.globs();
    let selection = select::select(select::glob_many(&globs, bounds.max_depth), bounds);
    let note = format!("{} patterns", globs.len());
    TierOutcome::from_selection(WebTier::Glob.as_str(), selection, SourceType::Web, false, vec![note])
}

/// Journal output lines worth parsing.
pub fn journal_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty() && !l.starts_with("-- No entries --"))
        .map(str::to_string)
        .collect()
}

/// Tier 3. Messages the web server units wrote to the journal.
pub(crate) async fn journal_tier<R: CommandRunner>(
    runner: &R,
    units: &[String],
    since: &str,
) -> TierOutcome {
    let mut notes = Vec::new();
    let mut candidates = Vec::new();
    let mut failures = 0;

    for unit in units {
        match runner.run(&CommandSpec::journal(unit, since)).await {
            Ok(output) => {
                let lines = journal_lines(&output);
                notes.push(format!("{unit}: {} lines", lines.len()));
                if !lines.is_empty() {
                    candidates.push(CandidateInput::journal(unit, lines, SourceType::Web));
                }
            }
            Err(e) => {
                failures += 1;
                notes.push(e.to_string());
            }
        }
    }

    let status = if !candidates.is_empty() {
        TierStatus::Resolved
    } else if failures == units.len() && !units.is_empty() {
        TierStatus::Failed
    } else {
        TierStatus::Empty
    };
    TierOutcome {
        attempt: TierAttempt {
            strategy: WebTier::Journal.as_str().to_string(),
            status,
            candidates: candidates.iter().map(CandidateInput::id).collect(),
            skipped: Vec::new(),
            note: format!("since {since:?}; {}", notes.join("; ")),
        },
        candidates,
    }
}
