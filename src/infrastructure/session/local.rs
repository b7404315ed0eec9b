//! Local Session
//!
//! Executes the rendered commands with `sh -c` on this machine. Used by
//! `--local` (deploying onto the host dockhand runs on) and by tests that
//! exercise the real git/tar sequences against a temporary directory.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use super::process::{run_with_timeout, ProcessError};
use crate::config::DeployConfig;
use crate::domain::ports::{CommandOutput, RemoteSession, SessionFactory};
use crate::domain::RemoteCommand;
use crate::error::{DeployError, DeployResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSessionFactory;

impl SessionFactory for LocalSessionFactory {
    type Session = LocalSession;

    fn open(&self, config: &DeployConfig) -> DeployResult<LocalSession> {
        Ok(LocalSession::new(config.command_timeout))
    }
}

/// Session bound to the local shell
#[derive(Debug, Clone)]
pub struct LocalSession {
    timeout: Duration,
}

impl LocalSession {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl RemoteSession for LocalSession {
    fn describe(&self) -> String {
        "localhost".to_string()
    }

    fn exec(&mut self, command: &RemoteCommand) -> DeployResult<CommandOutput> {
        let rendered = command.render();
        debug!(command = %rendered, "local exec");

        let out = run_with_timeout(
            Command::new("sh").arg("-c").arg(format!("exec 2>&1; {}", rendered)),
            self.timeout,
        )
        .map_err(|e| match e {
            ProcessError::Timeout => DeployError::Timeout {
                command: rendered.clone(),
                after: self.timeout,
            },
            other => DeployError::Connection {
                destination: self.describe(),
                message: other.to_string(),
            },
        })?;

        Ok(CommandOutput {
            status: out.code(),
            output: out.combined,
        })
    }

    fn upload(&mut self, local: &Path, remote: &str) -> DeployResult<()> {
        debug!(local = %local.display(), remote, "local copy");
        let target = Path::new(remote);
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::copy(local, target).map_err(|e| DeployError::Execution {
            command: format!("cp {} {}", local.display(), remote),
            status: 1,
            output: e.to_string(),
        })?;
        Ok(())
    }

    fn close(&mut self) -> DeployResult<()> {
        Ok(())
    }
}
