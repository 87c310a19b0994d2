//! External command execution

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;
use tokio::time::timeout;

use sign_net_core::error::SystemError;
use sign_net_core::Result;

/// Captured output of one external command
#[derive(Debug, Clone)]
pub struct CmdOutput {
    /// Whether the command exited with status zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: &str) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Seam between the appliers and the host system.
///
/// Everything that mutates or inspects live network state goes through
/// this trait, so tests can substitute a mock and assert on the exact
/// command sequence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: Vec<String>) -> Result<CmdOutput>;
}

/// Build an owned argument vector from string literals.
pub fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Production runner backed by `tokio::process` with a per-command timeout
pub struct SystemRunner {
    command_timeout: Duration,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: Vec<String>) -> Result<CmdOutput> {
        let mut cmd = Command::new(program);
        cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!("executing {} {}", program, args.join(" "));

        match timeout(self.command_timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let result = CmdOutput {
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };
                if !result.success {
                    debug!(
                        "{} exited with {:?}: {}",
                        program,
                        output.status.code(),
                        result.stderr.trim()
                    );
                }
                Ok(result)
            }
            Ok(Err(e)) => {
                warn!("{} failed to execute: {}", program, e);
                Err(SystemError::CommandFailed {
                    command: format!("{} {}", program, args.join(" ")),
                }
                .into())
            }
            Err(_) => {
                warn!("{} timed out after {:?}", program, self.command_timeout);
                Err(SystemError::CommandTimeout {
                    command: format!("{} {}", program, args.join(" ")),
                }
                .into())
            }
        }
    }
}

/// Run a command where failure is expected and survivable: log at warn and
/// carry on. The overriding goal is leaving the interface in some working
/// state, not strict correctness.
pub(crate) async fn best_effort(runner: &dyn CommandRunner, program: &str, args: &[&str]) {
    match runner.run(program, argv(args)).await {
        Ok(out) if out.success => {}
        Ok(out) => warn!(
            "{} {} failed: {}",
            program,
            args.join(" "),
            out.stderr.trim()
        ),
        Err(e) => warn!("{} {} failed: {}", program, args.join(" "), e),
    }
}
