//! Test builders: ergonomic constructors for events, configs and engines.
//!
//! These are designed for readability in test assertions, not for production
//! use. They panic on invalid input rather than returning `Result`.

use super::fake_runner::FakeRunner;
use super::fixtures::fixed_fallback;
use edgelog_core::config::Config;
use edgelog_core::{EventFactory, NormalizedEvent, SourceType};
use edgelog_discovery::DiscoveryEngine;
use std::path::{Path, PathBuf};

pub const TEST_ASSET: &str = "edge-01";

/// Normalise `lines` the way a run does: one parser for the whole input,
/// fixed asset and fallback time.
pub fn normalize_all(source_type: SourceType, lines: &[&str]) -> Vec<NormalizedEvent> {
    let factory = EventFactory::with_fallback_time(TEST_ASSET, fixed_fallback());
    let mut parser = source_type.parser();
    lines
        .iter()
        .map(|line| factory.normalize(source_type, line, parser.parse(line)))
        .collect()
}

// ---------------------------------------------------------------------------
// HostBuilder
// ---------------------------------------------------------------------------

/// A fake host filesystem under a temp dir, with a [`Config`] whose web,
/// resolver, syslog and application locations all point inside it.
///
/// # Example
///
/// ```rust
/// let host = HostBuilder::new()
///     .nginx_log("access.log", &["..."])
///     .build();
/// let engine = host.engine(FakeRunner::new());
/// ```
pub struct HostBuilder {
    dir: tempfile::TempDir,
    config: Config,
}

impl HostBuilder {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let mut config = Config::defaults();
        config.web.nginx_conf = root.join("etc/nginx/nginx.conf");
        config.web.nginx_log_dir = root.join("var/log/nginx");
        config.web.apache_confs = vec![root.join("etc/apache2/apache2.conf")];
        config.web.apache_log_dirs = vec![root.join("var/log/apache2")];
        config.web.nginx_globs = vec![format!("{}/var/log/nginx/access.log*", root.display())];
        config.web.apache_globs = vec![format!("{}/var/log/apache2/access.log*", root.display())];
        config.dns.globs = vec![format!("{}/var/log/named/*.log*", root.display())];
        config.syslog.globs = vec![
            format!("{}/var/log/syslog*", root.display()),
            format!("{}/var/log/auth.log*", root.display()),
        ];
        config.app.globs = vec![format!("{}/var/log/app/**/*.log*", root.display())];
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file under the host root (path relative to the root).
    pub fn file(self, rel: &str, body: &str) -> Self {
        let path = self.dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
        self
    }

    /// An access log under the nginx log directory.
    pub fn nginx_log(self, name: &str, lines: &[&str]) -> Self {
        let mut body = lines.join("\n");
        body.push('\n');
        self.file(&format!("var/log/nginx/{name}"), &body)
    }

    pub fn max_files(mut self, n: usize) -> Self {
        self.config.discovery.max_files = n;
        self
    }

    pub fn build(self) -> Host {
        Host {
            dir: self.dir,
            config: self.config,
        }
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A built fake host. Keeps the temp dir alive.
pub struct Host {
    dir: tempfile::TempDir,
    pub config: Config,
}

impl Host {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Discovery engine over this host, rooted at the host root.
    pub fn engine(&self, runner: FakeRunner) -> DiscoveryEngine<FakeRunner> {
        DiscoveryEngine::new(runner, self.config.clone()).with_root(self.dir.path())
    }

    /// Output location inside the host.
    pub fn out(&self, name: &str) -> PathBuf {
        self.dir.path().join("out").join(name)
    }
}
