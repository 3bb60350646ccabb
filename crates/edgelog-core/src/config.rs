//! Configuration types for edgelog.
//!
//! [`Config::load`] layers `~/.config/edgelog/config.toml` (and optionally an
//! explicit file) on top of the built-in defaults. [`Config::defaults`]
//! returns the same defaults without touching the filesystem (useful in
//! tests). Command-line flags override whatever is loaded here.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[discovery]
max_files            = 25
max_total_bytes      = 524288000
max_depth            = 12
command_timeout_secs = 10
journal_since        = "24 hours ago"
journal_units        = ["nginx", "apache2", "httpd"]

[web]
nginx_conf     = "/etc/nginx/nginx.conf"
nginx_log_dir  = "/var/log/nginx"
apache_confs   = [
    "/etc/apache2/apache2.conf",
    "/etc/apache2/sites-enabled/000-default.conf",
    "/etc/httpd/conf/httpd.conf",
    "/etc/httpd/conf.d/ssl.conf",
]
apache_log_dirs = ["/var/log/apache2", "/var/log/httpd"]
nginx_globs = [
    "/var/log/nginx/access.log*",
    "/var/log/nginx/*access*.log*",
    "/var/log/nginx/*access*",
    "/var/log/*nginx*access*.log*",
]
apache_globs = [
    "/var/log/apache2/access.log*",
    "/var/log/apache2/*access*.log*",
    "/var/log/httpd/access_log*",
    "/var/log/httpd/*access*.log*",
]

[alb]
patterns = [
    "AWSLogs/**/elasticloadbalancing/**/*",
    "**/*elb*access*log*",
    "**/*alb*access*log*",
    "**/*loadbalancer*access*log*",
    "**/*_elasticloadbalancing_*",
]

[firewall]
patterns = [
    "**/*firewall*.log*",
    "**/*pan*.log*",
    "**/*paloalto*.log*",
    "**/*forti*.log*",
    "**/*checkpoint*.log*",
    "**/*netflow*.log*",
    "**/*flow*.log*",
    "**/*traffic*.log*",
    "**/*fw*.csv",
    "**/*firewall*.csv",
]

[dns]
globs = [
    "/var/log/named/*.log*",
    "/var/log/named/named.log*",
    "/var/log/named/query.log*",
    "/var/log/bind/*.log*",
    "/var/log/bind9/*.log*",
    "/var/log/unbound/unbound.log*",
    "/var/log/dnsmasq*.log*",
    "/var/log/dnsmasq/*.log*",
    "/var/log/pihole/pihole.log*",
    "/var/log/pihole.log*",
]

[syslog]
globs = [
    "/var/log/syslog*",
    "/var/log/daemon.log*",
    "/var/log/auth.log*",
    "/var/log/kern.log*",
    "/var/log/messages*",
    "/var/log/secure*",
    "/var/log/remote/**/*",
    "/var/log/hosts/**/*",
    "/var/log/clients/**/*",
    "/var/log/rsyslog/**/*",
    "/var/log/syslog-ng/**/*",
]

[app]
globs = [
    "/var/log/vmware/**/*.log*",
    "/var/log/vmware/**/vpxd*",
    "/var/log/vmware/**/sso*",
    "/var/log/vmware/**/vsphere-ui*",
    "/var/log/vmware/**/applmgmt*",
    "/var/log/gitlab/**/*.log*",
    "/var/log/gitlab/**/current*",
    "/var/atlassian/**/logs/*.log*",
    "/var/atlassian/**/logs/catalina.out*",
    "/opt/atlassian/**/logs/*.log*",
    "/opt/atlassian/**/logs/catalina.out*",
    "/opt/zimbra/log/*.log*",
    "/var/log/grafana/*.log*",
    "/var/log/elasticsearch/*.log*",
    "/var/log/opensearch/*.log*",
    "/var/log/kibana/*.log*",
    "/var/log/opensearch-dashboards/*.log*",
    "/var/log/suricata/eve.json*",
]
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub web: WebConfig,
    pub alb: RootedConfig,
    pub firewall: RootedConfig,
    pub dns: SystemGlobConfig,
    pub syslog: SystemGlobConfig,
    pub app: SystemGlobConfig,
}

/// `[discovery]` section: bounds shared by every family.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// At most this many candidate files per run.
    pub max_files: usize,
    /// Stop selecting files once their cumulative size would exceed this.
    pub max_total_bytes: u64,
    /// `**` in a discovery pattern reaches at most this many directories down.
    pub max_depth: usize,
    /// Config-dump and journal commands are killed after this long.
    pub command_timeout_secs: u64,
    /// Journal lookback, passed to `journalctl --since`.
    pub journal_since: String,
    /// Service units queried in the journal tier.
    pub journal_units: Vec<String>,
}

/// `[web]` section: where nginx and Apache keep their config and logs.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    pub nginx_conf: PathBuf,
    /// Relative `access_log` paths resolve against this directory.
    pub nginx_log_dir: PathBuf,
    pub apache_confs: Vec<PathBuf>,
    /// Relative `CustomLog` paths resolve against the first of these that
    /// exists.
    pub apache_log_dirs: Vec<PathBuf>,
    pub nginx_globs: Vec<String>,
    pub apache_globs: Vec<String>,
}

impl WebConfig {
    /// All tier-2 globs, nginx first.
    pub fn globs(&self) -> Vec<String> {
        self.nginx_globs
            .iter()
            .chain(self.apache_globs.iter())
            .cloned()
            .collect()
    }
}

/// `[alb]` / `[firewall]` sections: glob patterns relative to the search root.
#[derive(Debug, Clone, Deserialize)]
pub struct RootedConfig {
    pub patterns: Vec<String>,
}

/// `[dns]` / `[syslog]` / `[app]` sections: absolute globs over the
/// locations those services log to.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemGlobConfig {
    pub globs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load the user config, then `explicit` if given, layered on top of the
    /// built-in defaults. A missing user config is not an error; a missing
    /// explicit file is.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(config_path().as_path()).required(false));
        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder.build()?.try_deserialize().map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("edgelog")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.discovery.max_files, 25);
        assert_eq!(cfg.discovery.max_total_bytes, 500 * 1024 * 1024);
        assert_eq!(cfg.discovery.journal_since, "24 hours ago");
        assert_eq!(cfg.web.nginx_log_dir, PathBuf::from("/var/log/nginx"));
        assert_eq!(cfg.web.globs().len(), 8);
        assert!(cfg.firewall.patterns.iter().any(|p| p.ends_with("*fw*.csv")));
        assert_eq!(cfg.discovery.max_depth, 12);
        assert!(cfg.dns.globs.contains(&"/var/log/pihole/pihole.log*".to_string()));
        assert!(cfg.syslog.globs.contains(&"/var/log/auth.log*".to_string()));
        assert!(cfg.app.globs.iter().all(|g| g.starts_with('/')));
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edgelog.toml");
        std::fs::write(&path, "[discovery]\nmax_files = 3\njournal_since = \"2 hours ago\"\n").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.discovery.max_files, 3);
        assert_eq!(cfg.discovery.journal_since, "2 hours ago");
        assert_eq!(cfg.discovery.command_timeout_secs, 10);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/edgelog.toml"))).is_err());
    }
}
