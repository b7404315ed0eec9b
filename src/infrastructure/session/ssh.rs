//! SSH Remote Session
//!
//! Drives the target through the system OpenSSH client. One control master
//! is started per run (`ControlMaster`/`ControlPath` in a private temporary
//! directory), so authentication happens once and every later `ssh`/`scp`
//! invocation rides the same connection. Closing the session asks the master
//! to exit.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::process::{run_with_timeout, status_with_timeout, ProcessError};
use crate::config::DeployConfig;
use crate::domain::ports::{CommandOutput, RemoteSession, SessionFactory};
use crate::domain::RemoteCommand;
use crate::error::{DeployError, DeployResult};

/// ssh exits with this status when the connection fails
const SSH_TRANSPORT_FAILURE: i32 = 255;
const CONNECT_MARKER: &str = "__DOCKHAND_SSH_OK__";

/// Opens [`SshSession`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct SshSessionFactory;

impl SessionFactory for SshSessionFactory {
    type Session = SshSession;

    fn open(&self, config: &DeployConfig) -> DeployResult<SshSession> {
        SshSession::open(config)
    }
}

/// Multiplexed SSH connection to the target host
pub struct SshSession {
    destination: String,
    port: u16,
    key: PathBuf,
    command_timeout: Duration,
    connect_timeout: Duration,
    control_dir: TempDir,
    open: bool,
}

impl SshSession {
    /// Start the control master and verify the connection
    pub fn open(config: &DeployConfig) -> DeployResult<Self> {
        let control_dir = tempfile::Builder::new()
            .prefix("dh")
            .tempdir()
            .map_err(|e| DeployError::Connection {
                destination: config.destination(),
                message: format!("cannot create control socket directory: {}", e),
            })?;

        let mut session = Self {
            destination: config.destination(),
            port: config.port,
            key: config.ssh_key.clone(),
            command_timeout: config.command_timeout,
            connect_timeout: config.connect_timeout,
            control_dir,
            open: false,
        };
        session.start_master()?;
        session.open = true;
        session.verify()?;
        info!(destination = %session.destination, "ssh session established");
        Ok(session)
    }

    fn control_path(&self) -> PathBuf {
        self.control_dir.path().join("ctl")
    }

    fn master_log(&self) -> PathBuf {
        self.control_dir.path().join("master.log")
    }

    /// Options shared by every ssh/scp invocation
    fn common_options(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.key.to_string_lossy().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path().display()),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
        ]
    }

    fn ssh(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-p").arg(self.port.to_string());
        cmd.args(self.common_options());
        cmd
    }

    fn connection_error(&self, message: impl Into<String>) -> DeployError {
        DeployError::Connection {
            destination: self.destination.clone(),
            message: message.into(),
        }
    }

    fn start_master(&self) -> DeployResult<()> {
        let mut cmd = self.ssh();
        cmd.args(["-M", "-N", "-f", "-E"])
            .arg(self.master_log())
            .args(["-o", "ControlPersist=yes"])
            .arg(&self.destination);

        // Background the master once authenticated; it keeps no stdio of ours.
        let deadline = self.connect_timeout + Duration::from_secs(5);
        let status = status_with_timeout(&mut cmd, deadline).map_err(|e| match e {
            ProcessError::Timeout => self.connection_error(format!(
                "no response within {}s",
                deadline.as_secs()
            )),
            other => self.connection_error(other.to_string()),
        })?;

        if !status.success() {
            let log = std::fs::read_to_string(self.master_log()).unwrap_or_default();
            return Err(self.connection_error(if log.trim().is_empty() {
                format!("ssh exited with {}", status)
            } else {
                log.trim().to_string()
            }));
        }
        Ok(())
    }

    /// Whether the control master still answers `-O check`
    fn master_alive(&self) -> bool {
        let mut cmd = self.ssh();
        cmd.args(["-O", "check"]).arg(&self.destination);
        matches!(status_with_timeout(&mut cmd, self.connect_timeout), Ok(status) if status.success())
    }

    /// Status 255 is also a legal remote exit code; it only means the
    /// transport failed when the control master is gone too.
    fn transport_failed(&self, code: i32) -> bool {
        code == SSH_TRANSPORT_FAILURE && !self.master_alive()
    }

    fn verify(&mut self) -> DeployResult<()> {
        let out = self.exec(&RemoteCommand::new("echo").arg(CONNECT_MARKER))?;
        if out.success() && out.output.contains(CONNECT_MARKER) {
            Ok(())
        } else {
            Err(self.connection_error(format!(
                "connection check failed (status {}): {}",
                out.status,
                out.output.trim()
            )))
        }
    }
}

impl RemoteSession for SshSession {
    fn describe(&self) -> String {
        self.destination.clone()
    }

    fn exec(&mut self, command: &RemoteCommand) -> DeployResult<CommandOutput> {
        let rendered = command.render();
        debug!(destination = %self.destination, command = %rendered, "ssh exec");

        let mut cmd = self.ssh();
        cmd.args(["-T", "-o", "ControlMaster=no"])
            .arg(&self.destination)
            .arg(format!("exec 2>&1; {}", rendered));

        let out = run_with_timeout(&mut cmd, self.command_timeout).map_err(|e| match e {
            ProcessError::Timeout => DeployError::Timeout {
                command: rendered.clone(),
                after: self.command_timeout,
            },
            other => self.connection_error(other.to_string()),
        })?;

        if self.transport_failed(out.code()) {
            return Err(self.connection_error(format!(
                "ssh transport failed while running `{}`: {}",
                rendered,
                out.combined.trim()
            )));
        }

        Ok(CommandOutput {
            status: out.code(),
            output: out.combined,
        })
    }

    fn upload(&mut self, local: &Path, remote: &str) -> DeployResult<()> {
        debug!(destination = %self.destination, local = %local.display(), remote, "scp upload");

        let mut cmd = Command::new("scp");
        cmd.arg("-q")
            .arg("-P")
            .arg(self.port.to_string())
            .args(self.common_options())
            .arg(local)
            .arg(format!("{}:{}", self.destination, remote));

        let out = run_with_timeout(&mut cmd, self.command_timeout).map_err(|e| match e {
            ProcessError::Timeout => DeployError::Timeout {
                command: format!("scp {} {}", local.display(), remote),
                after: self.command_timeout,
            },
            other => self.connection_error(other.to_string()),
        })?;

        if !out.status.success() {
            return Err(DeployError::Execution {
                command: format!("scp {} {}:{}", local.display(), self.destination, remote),
                status: out.code(),
                output: out.combined,
            });
        }
        Ok(())
    }

    fn close(&mut self) -> DeployResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        let mut cmd = self.ssh();
        cmd.args(["-O", "exit"]).arg(&self.destination);
        match run_with_timeout(&mut cmd, self.connect_timeout) {
            Ok(out) if out.status.success() => {
                debug!(destination = %self.destination, "ssh control master stopped");
                Ok(())
            }
            Ok(out) => Err(self.connection_error(format!(
                "failed to stop control master: {}",
                out.combined.trim()
            ))),
            Err(e) => Err(self.connection_error(e.to_string())),
        }
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.close() {
                warn!("{}", e);
            }
        }
    }
}
