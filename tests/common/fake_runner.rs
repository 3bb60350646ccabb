//! FakeRunner: a scripted [`CommandRunner`].
//!
//! Simulates `nginx -T`, `apachectl -V` and `journalctl` without spawning
//! real processes. Programs without a script fail with
//! [`CommandError::NotFound`], like on a host where they are not installed.

use edgelog_discovery::{CommandError, CommandRunner, CommandSpec};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Output(String),
    Timeout,
}

/// Scripted command runner. Records every command it is asked to run.
#[derive(Debug, Default)]
pub struct FakeRunner {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `program` prints `stdout` and succeeds.
    pub fn with_output(mut self, program: &str, stdout: impl Into<String>) -> Self {
        self.scripts
            .insert(program.to_string(), Script::Output(stdout.into()));
        self
    }

    /// `program` hangs until the runner's timeout.
    pub fn with_timeout(mut self, program: &str) -> Self {
        self.scripts.insert(program.to_string(), Script::Timeout);
        self
    }

    /// Every command run so far, rendered as a shell line.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether any command for `program` was run.
    pub fn ran(&self, program: &str) -> bool {
        self.calls()
            .iter()
            .any(|c| c.split_whitespace().next() == Some(program))
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        self.calls.lock().unwrap().push(spec.to_string());
        match self.scripts.get(&spec.program) {
            Some(Script::Output(out)) => Ok(out.clone()),
            Some(Script::Timeout) => Err(CommandError::Timeout {
                program: spec.program.clone(),
                timeout: Duration::from_secs(10),
            }),
            None => Err(CommandError::NotFound {
                program: spec.program.clone(),
            }),
        }
    }
}
