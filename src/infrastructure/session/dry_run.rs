//! Dry-run Session
//!
//! Accepts every command without contacting the target. Each command
//! succeeds with empty output, so status probes see an existing checkout
//! and the printed plan shows the sequence of a repeat deploy. Checks that
//! depend on real output are skipped by the stages in dry-run mode.

use std::path::Path;

use tracing::debug;

use crate::config::DeployConfig;
use crate::domain::ports::{CommandOutput, RemoteSession, SessionFactory};
use crate::domain::RemoteCommand;
use crate::error::DeployResult;

#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSessionFactory;

impl SessionFactory for DryRunSessionFactory {
    type Session = DryRunSession;

    fn open(&self, config: &DeployConfig) -> DeployResult<DryRunSession> {
        Ok(DryRunSession::new(config.destination()))
    }
}

#[derive(Debug, Clone)]
pub struct DryRunSession {
    destination: String,
}

impl DryRunSession {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
        }
    }
}

impl RemoteSession for DryRunSession {
    fn describe(&self) -> String {
        format!("{} (dry run)", self.destination)
    }

    fn exec(&mut self, command: &RemoteCommand) -> DeployResult<CommandOutput> {
        debug!(command = %command, "dry run");
        Ok(CommandOutput::ok(""))
    }

    fn upload(&mut self, local: &Path, remote: &str) -> DeployResult<()> {
        debug!(local = %local.display(), remote, "dry run upload");
        Ok(())
    }

    fn close(&mut self) -> DeployResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_commands_and_uploads() {
        let mut session = DryRunSession::new("deploy@h");
        session
            .run(&RemoteCommand::new("mkdir").args(["-p", "/srv/bot"]))
            .unwrap();
        session.upload(Path::new("/does/not/exist/.env"), "/srv/bot/.env").unwrap();
        session.close().unwrap();
        assert_eq!(session.describe(), "deploy@h (dry run)");
    }

    #[test]
    fn probes_report_success_with_no_output() {
        let mut session = DryRunSession::new("deploy@h");
        let out = session.exec(&RemoteCommand::new("test").args(["-d", "/x"])).unwrap();
        assert!(out.success());
        assert_eq!(out.lines().count(), 0);
    }
}
