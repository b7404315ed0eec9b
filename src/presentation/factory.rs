//! Use Case Factory
//!
//! Creates deploy use cases with a session transport wired up.
//! This is the dependency injection point for the application.

use crate::application::{DeployOptions, DeployReport, DeployUseCase};
use crate::config::DeployConfig;
use crate::domain::ports::DeployEventSink;
use crate::error::DeployResult;
use crate::infrastructure::{DryRunSessionFactory, LocalSessionFactory, SshSessionFactory};

/// Deploy use case talking to the target over OpenSSH
pub type SshDeployUseCase = DeployUseCase<SshSessionFactory>;

/// Deploy use case running every command on this machine
pub type LocalDeployUseCase = DeployUseCase<LocalSessionFactory>;

/// Deploy use case that only records the command sequence
pub type DryRunDeployUseCase = DeployUseCase<DryRunSessionFactory>;

/// How the orchestrator reaches the target host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Ssh,
    /// `--local`: the target is the operator's machine
    Local,
    /// `--dry-run` and `plan`
    DryRun,
}

impl SessionMode {
    /// Pick the transport from the command-line flags; dry run wins
    pub fn from_flags(local: bool, dry_run: bool) -> Self {
        if dry_run {
            Self::DryRun
        } else if local {
            Self::Local
        } else {
            Self::Ssh
        }
    }
}

/// Create the SSH deploy use case
pub fn create_deploy_use_case() -> SshDeployUseCase {
    DeployUseCase::new(SshSessionFactory)
}

pub fn create_local_deploy_use_case() -> LocalDeployUseCase {
    DeployUseCase::new(LocalSessionFactory)
}

pub fn create_dry_run_deploy_use_case() -> DryRunDeployUseCase {
    DeployUseCase::new(DryRunSessionFactory)
}

/// Run one deploy with the transport selected by `mode`
///
/// `options.dry_run` is forced on for [`SessionMode::DryRun`] so that
/// remote verification steps are skipped consistently.
pub fn execute(
    mode: SessionMode,
    config: &DeployConfig,
    options: &DeployOptions,
    events: &dyn DeployEventSink,
) -> DeployResult<DeployReport> {
    match mode {
        SessionMode::Ssh => create_deploy_use_case().execute(config, options, events),
        SessionMode::Local => create_local_deploy_use_case().execute(config, options, events),
        SessionMode::DryRun => {
            let options = options.clone().with_dry_run(true);
            create_dry_run_deploy_use_case().execute(config, &options, events)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_flag_wins_over_local() {
        assert_eq!(SessionMode::from_flags(true, true), SessionMode::DryRun);
        assert_eq!(SessionMode::from_flags(true, false), SessionMode::Local);
        assert_eq!(SessionMode::from_flags(false, false), SessionMode::Ssh);
    }

    #[test]
    fn default_mode_is_ssh() {
        assert_eq!(SessionMode::default(), SessionMode::Ssh);
    }
}
