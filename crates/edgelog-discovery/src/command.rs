//! External command capability.
//!
//! Tier 1 and tier 3 discovery need the text output of system utilities
//! (`nginx -T`, `apachectl -V`, `journalctl`). They get it through
//! [`CommandRunner`], so the tiering logic can be exercised with a fake
//! runner and no real processes.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

/// A command to run: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `nginx -T`: test the configuration and dump it to stdout.
    pub fn nginx_dump() -> Self {
        Self::new("nginx", ["-T"])
    }

    /// `apachectl -V`: compile settings, including `HTTPD_ROOT`.
    pub fn apache_settings() -> Self {
        Self::new("apachectl", ["-V"])
    }

    /// Journal messages for `unit` since `since`, message text only.
    pub fn journal(unit: &str, since: &str) -> Self {
        Self::new(
            "journalctl",
            ["-u", unit, "--since", since, "--no-pager", "-o", "cat"],
        )
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Why a command produced no usable output. Every variant means the same
/// thing to discovery: this attempt found nothing.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{program}: command not found")]
    NotFound { program: String },
    #[error("{program}: timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program}: exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs a [`CommandSpec`] and returns its stdout.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> impl Future<Output = Result<String, CommandError>> + Send;
}

/// Runs real processes with `tokio::process`, killing them after `timeout`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> impl Future<Output = Result<String, CommandError>> + Send {
        let timeout = self.timeout;
        let spec = spec.clone();
        async move {
            let program = spec.program.clone();
            let mut cmd = tokio::process::Command::new(&spec.program);
            cmd.args(&spec.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            tracing::debug!(command = %spec, ?timeout, "running discovery command");
            let output = match tokio::time::timeout(timeout, cmd.output()).await {
                Err(_) => return Err(CommandError::Timeout { program, timeout }),
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(CommandError::NotFound { program })
                }
                Ok(Err(source)) => return Err(CommandError::Io { program, source }),
                Ok(Ok(output)) => output,
            };

            // Some tools exit non-zero but still print what we need
            // (`nginx -T` with a warning-level config problem).
            if !output.status.success() && output.stdout.is_empty() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CommandError::Failed {
                    program,
                    status: output.status.to_string(),
                    stderr: stderr.lines().next().unwrap_or_default().to_string(),
                });
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
    }
}
