//! Remote Session Port
//!
//! Abstracts the connection used to drive the target host. The orchestrator
//! opens exactly one session per run through a [`SessionFactory`], issues
//! commands one at a time, and closes it on every exit path.

use std::path::Path;

use crate::config::DeployConfig;
use crate::domain::command::RemoteCommand;
use crate::error::{DeployError, DeployResult};

/// Exit status and combined stdout+stderr of one remote command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub status: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            status: 0,
            output: output.into(),
        }
    }

    pub fn failed(status: i32, output: impl Into<String>) -> Self {
        Self {
            status,
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Non-empty trimmed output lines
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// One authenticated connection to the target host
///
/// Every call blocks until the remote side finished.
pub trait RemoteSession {
    /// Human-readable target (e.g. `deploy@10.0.0.5`)
    fn describe(&self) -> String;

    /// Run a command and return its raw status
    ///
    /// Only transport failures and timeouts are errors here; a non-zero exit
    /// status is returned as-is. Use this for probes.
    fn exec(&mut self, command: &RemoteCommand) -> DeployResult<CommandOutput>;

    /// Copy a local file to an absolute path on the target
    fn upload(&mut self, local: &Path, remote: &str) -> DeployResult<()>;

    /// Release the connection
    fn close(&mut self) -> DeployResult<()>;

    /// Run a command that must succeed
    fn run(&mut self, command: &RemoteCommand) -> DeployResult<CommandOutput> {
        let out = self.exec(command)?;
        if out.success() {
            Ok(out)
        } else {
            Err(DeployError::Execution {
                command: command.render(),
                status: out.status,
                output: out.output,
            })
        }
    }
}

/// Opens sessions for a deployment run
pub trait SessionFactory {
    type Session: RemoteSession;

    fn open(&self, config: &DeployConfig) -> DeployResult<Self::Session>;
}
