//! # edgelog-discovery
//!
//! Finds log inputs when the operator did not name any. Web access logs go
//! through a tiered fallback (server config, well-known globs, the service
//! journal), stopping at the first tier that finds something. Load-balancer
//! and firewall logs are searched for under a root directory. Resolver,
//! syslog and application logs come from configured system globs.
//!
//! Every attempt lands in a [`DiscoveryReport`]. Finding nothing is a valid
//! outcome, never an error.

pub mod command;
pub mod report;
pub mod rooted;
pub mod select;
pub mod system;
pub mod web;

pub use command::{CommandError, CommandRunner, CommandSpec, SystemRunner};
pub use report::{report_path_for, DiscoveryReport, SkippedPath, TierAttempt, TierStatus};
pub use select::Bounds;
pub use web::WebTier;

use edgelog_core::config::Config;
use edgelog_core::{CandidateInput, SourceType};
use select::Selection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What one tier produced: its report entry and the inputs it resolved.
#[derive(Debug, Clone)]
pub(crate) struct TierOutcome {
    pub attempt: TierAttempt,
    pub candidates: Vec<CandidateInput>,
}

impl TierOutcome {
    pub(crate) fn from_selection(
        strategy: &str,
        selection: Selection,
        hint: SourceType,
        failed: bool,
        notes: Vec<String>,
    ) -> Self {
        let status = if !selection.is_empty() {
            TierStatus::Resolved
        } else if failed {
            TierStatus::Failed
        } else {
            TierStatus::Empty
        };
        let candidates: Vec<_> = selection
            .selected
            .into_iter()
            .map(|p| CandidateInput::path(p, hint))
            .collect();
        Self {
            attempt: TierAttempt {
                strategy: strategy.to_string(),
                status,
                candidates: candidates.iter().map(CandidateInput::id).collect(),
                skipped: selection.skipped,
                note: notes.join("; "),
            },
            candidates,
        }
    }
}

/// Result of [`DiscoveryEngine::discover`].
#[derive(Debug, Clone)]
pub struct Discovery {
    pub report: DiscoveryReport,
    /// In processing order.
    pub candidates: Vec<CandidateInput>,
}

/// Discovery for one run. Generic over the command capability so tests can
/// drive the tiers without real processes.
#[derive(Debug, Clone)]
pub struct DiscoveryEngine<R> {
    runner: R,
    config: Config,
    root: PathBuf,
    journal_since: String,
}

impl DiscoveryEngine<SystemRunner> {
    /// Real processes, killed after `[discovery] command_timeout_secs`.
    pub fn system(config: Config) -> Self {
        let timeout = Duration::from_secs(config.discovery.command_timeout_secs);
        Self::new(SystemRunner::new(timeout), config)
    }
}

impl<R: CommandRunner> DiscoveryEngine<R> {
    pub fn new(runner: R, config: Config) -> Self {
        let journal_since = config.discovery.journal_since.clone();
        Self {
            runner,
            config,
            root: PathBuf::from("."),
            journal_since,
        }
    }

    /// Directory searched for load-balancer and firewall logs.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Journal lookback, e.g. `"2 hours ago"`.
    pub fn with_journal_since(mut self, since: impl Into<String>) -> Self {
        self.journal_since = since.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn discover(&self, source_type: SourceType) -> Discovery {
        let mut report = DiscoveryReport::new(source_type);
        let candidates = match source_type {
            SourceType::Web => self.discover_web(&mut report).await,
            SourceType::Alb => self.discover_rooted(&mut report, &self.config.alb.patterns, source_type),
            SourceType::Firewall => {
                self.discover_rooted(&mut report, &self.config.firewall.patterns, source_type)
            }
            SourceType::Dns => self.discover_system(&mut report, &self.config.dns.globs, source_type),
            SourceType::Syslog => {
                self.discover_system(&mut report, &self.config.syslog.globs, source_type)
            }
            SourceType::App => self.discover_system(&mut report, &self.config.app.globs, source_type),
        };
        report.resolved = candidates.iter().map(CandidateInput::id).collect();
        tracing::debug!(
            source_type = %source_type,
            resolved = report.resolved.len(),
            "discovery finished"
        );
        Discovery { report, candidates }
    }

    fn bounds(&self) -> Bounds {
        Bounds::from_config(&self.config.discovery)
    }

    async fn discover_web(&self, report: &mut DiscoveryReport) -> Vec<CandidateInput> {
        let mut resolved_by: Option<WebTier> = None;
        let mut candidates = Vec::new();

        for tier in WebTier::ALL {
            if let Some(by) = resolved_by {
                report
                    .attempts
                    .push(TierAttempt::skipped_after(tier.as_str(), by.as_str()));
                continue;
            }
            let outcome = match tier {
                WebTier::Config => web::config_tier(&self.runner, &self.config.web, self.bounds()).await,
                WebTier::Glob => web::glob_tier(&self.config.web, self.bounds()),
                WebTier::Journal => {
                    web::journal_tier(
                        &self.runner,
                        &self.config.discovery.journal_units,
                        &self.journal_since,
                    )
                    .await
                }
            };
            log_attempt(&outcome.attempt);
            if !outcome.candidates.is_empty() {
                resolved_by = Some(tier);
                candidates = outcome.candidates;
            }
            report.attempts.push(outcome.attempt);
        }
        candidates
    }

    fn discover_rooted(
        &self,
        report: &mut DiscoveryReport,
        patterns: &[String],
        hint: SourceType,
    ) -> Vec<CandidateInput> {
        let outcome = rooted::search(&self.root, patterns, self.bounds(), hint);
        log_attempt(&outcome.attempt);
        report.attempts.push(outcome.attempt);
        outcome.candidates
    }

    fn discover_system(
        &self,
        report: &mut DiscoveryReport,
        globs: &[String],
        hint: SourceType,
    ) -> Vec<CandidateInput> {
        let outcome = system::search(globs, self.bounds(), hint);
        log_attempt(&outcome.attempt);
        report.attempts.push(outcome.attempt);
        outcome.candidates
    }
}

fn log_attempt(attempt: &TierAttempt) {
    match attempt.status {
        TierStatus::Failed => tracing::warn!(
            strategy = %attempt.strategy,
            note = %attempt.note,
            "discovery tier failed"
        ),
        _ => tracing::debug!(
            strategy = %attempt.strategy,
            status = ?attempt.status,
            candidates = attempt.candidates.len(),
            skipped = attempt.skipped.len(),
            "discovery tier finished"
        ),
    }
}
